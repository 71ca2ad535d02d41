//! NetFlow 디코더 에러 타입
//!
//! [`NetflowError`]는 패킷/템플릿/필드 디코딩과 디코더 구성 과정의 모든 에러를 표현합니다.
//! `From<NetflowError> for FlowpostError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use bytes::Buf;

use flowpost_core::error::{ConfigError, DecodeError, FlowpostError, PipelineError};

/// NetFlow 디코더 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum NetflowError {
    /// 버퍼가 예상보다 짧음 (헤더, 셋, 레코드)
    #[error("unexpected end of input: {context} needs {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// 읽던 구조의 이름
        context: &'static str,
        /// 필요한 바이트 수
        needed: usize,
        /// 남아 있던 바이트 수
        remaining: usize,
    },

    /// 지원하지 않거나 비활성화된 프로토콜 버전
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    /// 헤더 값이 서로 맞지 않는 패킷
    #[error("malformed {context}: {reason}")]
    MalformedPacket {
        /// 읽던 구조의 이름
        context: &'static str,
        /// 거부 사유
        reason: String,
    },

    /// 알 수 없는 v8 집계 유형
    #[error("unsupported v8 aggregation: {0}")]
    UnknownAggregation(u8),

    /// 잘못된 템플릿 정의
    #[error("invalid template {template_id}: {reason}")]
    InvalidTemplate {
        /// 템플릿 ID
        template_id: u16,
        /// 거부 사유
        reason: String,
    },

    /// 필드가 없는 템플릿으로 디코딩 시도
    #[error("empty template")]
    EmptyTemplate,

    /// 단일 필드 값 디코딩 실패
    #[error("cannot decode {decoder}: {reason}")]
    FieldDecode {
        /// 디코더 이름
        decoder: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 사용자 정의 필드 로딩 실패
    #[error("custom field definitions error: {source_name}: {reason}")]
    CustomFields {
        /// 정의 파일 경로 또는 출처
        source_name: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 레지스트리에 없는 프로토콜 이름
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    /// 이미 실행 중
    #[error("decoder is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("decoder is not running")]
    NotRunning,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetflowError {
    /// 필드 디코딩 에러를 생성합니다.
    pub(crate) fn field(decoder: &'static str, reason: impl Into<String>) -> Self {
        Self::FieldDecode {
            decoder,
            reason: reason.into(),
        }
    }

    /// 템플릿 정의 에러를 생성합니다.
    pub(crate) fn template(template_id: u16, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template_id,
            reason: reason.into(),
        }
    }

    /// 입력 부족으로 생긴 에러인지 확인합니다.
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. })
    }
}

/// `buf`에 `needed` 바이트 이상 남아 있는지 확인합니다.
///
/// `Buf::get_*`는 입력이 모자라면 panic 하므로 모든 읽기 전에 호출합니다.
pub(crate) fn ensure_remaining(
    buf: &impl Buf,
    needed: usize,
    context: &'static str,
) -> Result<(), NetflowError> {
    if buf.remaining() < needed {
        return Err(NetflowError::UnexpectedEof {
            context,
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

impl From<NetflowError> for FlowpostError {
    fn from(err: NetflowError) -> Self {
        match err {
            NetflowError::UnexpectedEof {
                context,
                needed,
                remaining,
            } => FlowpostError::Decode(DecodeError::Truncated {
                context: context.to_owned(),
                needed,
                remaining,
            }),
            NetflowError::UnsupportedVersion(version) => {
                FlowpostError::Decode(DecodeError::UnsupportedVersion(version))
            }
            NetflowError::Config { field, reason } => {
                FlowpostError::Config(ConfigError::InvalidValue { field, reason })
            }
            NetflowError::UnknownProtocol(name) => {
                FlowpostError::Config(ConfigError::InvalidValue {
                    field: "netflow.protocols".to_owned(),
                    reason: format!("unknown protocol '{name}'"),
                })
            }
            NetflowError::CustomFields {
                source_name,
                reason,
            } => FlowpostError::Config(ConfigError::ParseFailed {
                reason: format!("{source_name}: {reason}"),
            }),
            NetflowError::AlreadyRunning => FlowpostError::Pipeline(PipelineError::AlreadyRunning),
            NetflowError::NotRunning => FlowpostError::Pipeline(PipelineError::NotRunning),
            NetflowError::Io(e) => FlowpostError::Io(e),
            NetflowError::MalformedPacket { context, reason } => {
                FlowpostError::Decode(DecodeError::Malformed {
                    what: context.to_owned(),
                    reason,
                })
            }
            other @ (NetflowError::UnknownAggregation(_)
            | NetflowError::InvalidTemplate { .. }
            | NetflowError::EmptyTemplate
            | NetflowError::FieldDecode { .. }) => FlowpostError::Decode(DecodeError::Malformed {
                what: "netflow packet".to_owned(),
                reason: other.to_string(),
            }),
        }
    }
}
