//! 디코더 설정
//!
//! [`DecoderConfig`]는 core의 [`NetflowConfig`](flowpost_core::config::NetflowConfig)를
//! 기반으로 디코더와 프로토콜 인스턴스가 쓰는 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use flowpost_core::config::FlowpostConfig;
//! use flowpost_netflow::config::DecoderConfig;
//!
//! let core_config = FlowpostConfig::default();
//! let config = DecoderConfig::from_core(&core_config.netflow);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use flowpost_core::config::{KNOWN_PROTOCOLS, NetflowConfig};

use crate::error::NetflowError;

/// 디코더 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// 활성화할 프로토콜 이름 목록
    pub protocols: Vec<String>,
    /// 세션/템플릿 만료 주기 (초). 0이면 만료하지 않음
    pub expiration_timeout_secs: u64,
    /// 시퀀스 번호 역행으로 exporter 재시작을 감지할지 여부
    pub detect_sequence_reset: bool,
    /// 재시작으로 판단할 시퀀스 역행 폭
    pub sequence_reset_threshold: u32,
    /// exporter 포트와 무관하게 템플릿 공유
    pub share_templates: bool,
    /// 템플릿보다 먼저 온 데이터 셋을 보관할지 여부
    pub cache_unknown_templates: bool,
    /// 보관 캐시 정리 주기 (초)
    pub pending_cleanup_interval_secs: u64,
    /// 보관 캐시 항목 최대 보관 시간 (초)
    pub pending_removal_threshold_secs: u64,
    /// 사용자 정의 필드 YAML 파일 목록
    pub custom_definitions: Vec<PathBuf>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::from_core(&NetflowConfig::default())
    }
}

impl DecoderConfig {
    /// core의 `NetflowConfig`에서 디코더 설정을 생성합니다.
    pub fn from_core(core: &NetflowConfig) -> Self {
        Self {
            protocols: core.protocols.clone(),
            expiration_timeout_secs: core.expiration_timeout_secs,
            detect_sequence_reset: core.detect_sequence_reset,
            sequence_reset_threshold: core.sequence_reset_threshold,
            share_templates: core.share_templates,
            cache_unknown_templates: core.cache_unknown_templates,
            pending_cleanup_interval_secs: core.pending_cleanup_interval_secs,
            pending_removal_threshold_secs: core.pending_removal_threshold_secs,
            custom_definitions: core.custom_definitions.iter().map(PathBuf::from).collect(),
        }
    }

    /// 세션/템플릿 만료 주기. 만료가 꺼져 있으면 `None`
    pub fn expiration_timeout(&self) -> Option<Duration> {
        (self.expiration_timeout_secs > 0).then(|| Duration::from_secs(self.expiration_timeout_secs))
    }

    /// 보관 캐시 정리 주기
    pub fn pending_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.pending_cleanup_interval_secs)
    }

    /// 보관 캐시 항목 최대 보관 시간
    pub fn pending_removal_threshold(&self) -> Duration {
        Duration::from_secs(self.pending_removal_threshold_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NetflowError> {
        if self.protocols.is_empty() {
            return Err(NetflowError::Config {
                field: "protocols".to_owned(),
                reason: "at least one protocol is required".to_owned(),
            });
        }
        for (idx, name) in self.protocols.iter().enumerate() {
            if !KNOWN_PROTOCOLS.contains(&name.as_str()) {
                return Err(NetflowError::UnknownProtocol(name.clone()));
            }
            if self.protocols[..idx].contains(name) {
                return Err(NetflowError::Config {
                    field: "protocols".to_owned(),
                    reason: format!("protocol '{name}' listed more than once"),
                });
            }
        }

        if self.detect_sequence_reset && self.sequence_reset_threshold == 0 {
            return Err(NetflowError::Config {
                field: "sequence_reset_threshold".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.cache_unknown_templates {
            if self.pending_cleanup_interval_secs == 0 {
                return Err(NetflowError::Config {
                    field: "pending_cleanup_interval_secs".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                });
            }
            if self.pending_removal_threshold_secs == 0 {
                return Err(NetflowError::Config {
                    field: "pending_removal_threshold_secs".to_owned(),
                    reason: "must be greater than 0".to_owned(),
                });
            }
        }

        Ok(())
    }
}

/// 디코더 설정 빌더
#[derive(Default)]
pub struct DecoderConfigBuilder {
    config: DecoderConfig,
}

impl DecoderConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 활성화할 프로토콜을 설정합니다.
    pub fn protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// 만료 주기(초)를 설정합니다.
    pub fn expiration_timeout_secs(mut self, secs: u64) -> Self {
        self.config.expiration_timeout_secs = secs;
        self
    }

    /// 시퀀스 재시작 감지 여부를 설정합니다.
    pub fn detect_sequence_reset(mut self, enabled: bool) -> Self {
        self.config.detect_sequence_reset = enabled;
        self
    }

    /// 시퀀스 재시작 임계값을 설정합니다.
    pub fn sequence_reset_threshold(mut self, threshold: u32) -> Self {
        self.config.sequence_reset_threshold = threshold;
        self
    }

    /// 템플릿 공유 여부를 설정합니다.
    pub fn share_templates(mut self, enabled: bool) -> Self {
        self.config.share_templates = enabled;
        self
    }

    /// 미확인 템플릿 캐시 사용 여부를 설정합니다.
    pub fn cache_unknown_templates(mut self, enabled: bool) -> Self {
        self.config.cache_unknown_templates = enabled;
        self
    }

    /// 보관 캐시 정리 주기(초)를 설정합니다.
    pub fn pending_cleanup_interval_secs(mut self, secs: u64) -> Self {
        self.config.pending_cleanup_interval_secs = secs;
        self
    }

    /// 보관 캐시 최대 보관 시간(초)을 설정합니다.
    pub fn pending_removal_threshold_secs(mut self, secs: u64) -> Self {
        self.config.pending_removal_threshold_secs = secs;
        self
    }

    /// 사용자 정의 필드 파일을 추가합니다.
    pub fn custom_definition(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.custom_definitions.push(path.into());
        self
    }

    /// 설정을 검증하고 `DecoderConfig`를 생성합니다.
    pub fn build(self) -> Result<DecoderConfig, NetflowError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
