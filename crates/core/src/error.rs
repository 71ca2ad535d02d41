//! 에러 타입 -- 도메인별 에러 정의

/// Flowpost 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FlowpostError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// 패킷/레코드 디코딩 에러
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중
    #[error("pipeline is already running")]
    AlreadyRunning,

    /// 실행 중이 아님
    #[error("pipeline is not running")]
    NotRunning,

    /// 초기화 실패
    #[error("pipeline init failed: {0}")]
    InitFailed(String),
}

/// 디코딩 에러
///
/// 도메인 크레이트의 세부 에러를 호출자에게 전달할 때 사용합니다.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// 입력이 예상보다 짧음
    #[error("unexpected end of input: {context} needs {needed} bytes, {remaining} remaining")]
    Truncated {
        context: String,
        needed: usize,
        remaining: usize,
    },

    /// 지원하지 않는 프로토콜 버전
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u16),

    /// 잘못된 형식
    #[error("malformed {what}: {reason}")]
    Malformed { what: String, reason: String },
}
