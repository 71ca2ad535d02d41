//! 설정 관리 -- flowpost.toml 파싱 및 런타임 설정
//!
//! [`FlowpostConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`FLOWPOST_NETFLOW_SHARE_TEMPLATES=true` 형식)
//! 2. 설정 파일 (`flowpost.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), flowpost_core::error::FlowpostError> {
//! use flowpost_core::config::FlowpostConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FlowpostConfig::load("flowpost.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FlowpostConfig::parse("[netflow]\nshare_templates = true")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FlowpostError};

/// 지원하는 NetFlow/IPFIX 프로토콜 이름
pub const KNOWN_PROTOCOLS: [&str; 7] = ["v1", "v5", "v6", "v7", "v8", "v9", "ipfix"];

/// Flowpost 통합 설정
///
/// `flowpost.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowpostConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// NetFlow 디코더 설정
    #[serde(default)]
    pub netflow: NetflowConfig,
}

impl FlowpostConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FlowpostError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowpostError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FlowpostError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FlowpostError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FlowpostError> {
        toml::from_str(toml_str).map_err(|e| {
            FlowpostError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FLOWPOST_{SECTION}_{FIELD}`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FLOWPOST_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FLOWPOST_GENERAL_LOG_FORMAT");

        // NetFlow
        let netflow = &mut self.netflow;
        override_csv(&mut netflow.protocols, "FLOWPOST_NETFLOW_PROTOCOLS");
        override_u64(
            &mut netflow.expiration_timeout_secs,
            "FLOWPOST_NETFLOW_EXPIRATION_TIMEOUT_SECS",
        );
        override_bool(
            &mut netflow.detect_sequence_reset,
            "FLOWPOST_NETFLOW_DETECT_SEQUENCE_RESET",
        );
        override_u32(
            &mut netflow.sequence_reset_threshold,
            "FLOWPOST_NETFLOW_SEQUENCE_RESET_THRESHOLD",
        );
        override_bool(
            &mut netflow.share_templates,
            "FLOWPOST_NETFLOW_SHARE_TEMPLATES",
        );
        override_bool(
            &mut netflow.cache_unknown_templates,
            "FLOWPOST_NETFLOW_CACHE_UNKNOWN_TEMPLATES",
        );
        override_u64(
            &mut netflow.pending_cleanup_interval_secs,
            "FLOWPOST_NETFLOW_PENDING_CLEANUP_INTERVAL_SECS",
        );
        override_u64(
            &mut netflow.pending_removal_threshold_secs,
            "FLOWPOST_NETFLOW_PENDING_REMOVAL_THRESHOLD_SECS",
        );
        override_csv(
            &mut netflow.custom_definitions,
            "FLOWPOST_NETFLOW_CUSTOM_DEFINITIONS",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FlowpostError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        self.netflow.validate()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// NetFlow/IPFIX 디코더 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetflowConfig {
    /// 활성화할 프로토콜 (v1, v5, v6, v7, v8, v9, ipfix)
    pub protocols: Vec<String>,
    /// 세션/템플릿 만료 주기 (초, 0이면 만료 비활성화)
    pub expiration_timeout_secs: u64,
    /// 시퀀스 번호 리셋 감지 여부
    pub detect_sequence_reset: bool,
    /// 리셋으로 판단할 시퀀스 번호 역행 폭
    pub sequence_reset_threshold: u32,
    /// 같은 주소의 exporter끼리 포트와 무관하게 템플릿 공유
    pub share_templates: bool,
    /// 템플릿보다 먼저 도착한 데이터 셋 보관 여부
    pub cache_unknown_templates: bool,
    /// 대기 캐시 정리 주기 (초)
    pub pending_cleanup_interval_secs: u64,
    /// 대기 캐시 항목 제거 기준 나이 (초)
    pub pending_removal_threshold_secs: u64,
    /// 사용자 정의 필드 YAML 파일 경로
    pub custom_definitions: Vec<String>,
}

impl Default for NetflowConfig {
    fn default() -> Self {
        Self {
            protocols: KNOWN_PROTOCOLS.iter().map(|p| (*p).to_owned()).collect(),
            expiration_timeout_secs: 30 * 60,
            detect_sequence_reset: true,
            sequence_reset_threshold: 1000,
            share_templates: false,
            cache_unknown_templates: true,
            pending_cleanup_interval_secs: 60,
            pending_removal_threshold_secs: 5 * 60,
            custom_definitions: Vec::new(),
        }
    }
}

impl NetflowConfig {
    /// 섹션 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FlowpostError> {
        if self.protocols.is_empty() {
            return Err(invalid("netflow.protocols", "at least one protocol is required"));
        }
        for (idx, name) in self.protocols.iter().enumerate() {
            if !KNOWN_PROTOCOLS.contains(&name.as_str()) {
                return Err(invalid(
                    "netflow.protocols",
                    &format!(
                        "unknown protocol '{name}', must be one of: {}",
                        KNOWN_PROTOCOLS.join(", ")
                    ),
                ));
            }
            if self.protocols[..idx].contains(name) {
                return Err(invalid(
                    "netflow.protocols",
                    &format!("protocol '{name}' listed more than once"),
                ));
            }
        }

        if self.detect_sequence_reset && self.sequence_reset_threshold == 0 {
            return Err(invalid(
                "netflow.sequence_reset_threshold",
                "must be greater than 0",
            ));
        }

        if self.cache_unknown_templates {
            if self.pending_cleanup_interval_secs == 0 {
                return Err(invalid(
                    "netflow.pending_cleanup_interval_secs",
                    "must be greater than 0 when cache_unknown_templates is enabled",
                ));
            }
            if self.pending_removal_threshold_secs == 0 {
                return Err(invalid(
                    "netflow.pending_removal_threshold_secs",
                    "must be greater than 0 when cache_unknown_templates is enabled",
                ));
            }
        }

        if self.custom_definitions.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid(
                "netflow.custom_definitions",
                "paths must not be empty",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> FlowpostError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = FlowpostConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.netflow.protocols.len(), 7);
        assert_eq!(config.netflow.expiration_timeout_secs, 1800);
        assert!(config.netflow.detect_sequence_reset);
        assert!(config.netflow.cache_unknown_templates);
        assert!(!config.netflow.share_templates);
    }

    #[test]
    fn default_config_passes_validation() {
        FlowpostConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = FlowpostConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.netflow.sequence_reset_threshold, 1000);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[netflow]
protocols = ["v5", "ipfix"]
share_templates = true
"#;
        let config = FlowpostConfig::parse(toml).unwrap();
        assert_eq!(config.netflow.protocols, vec!["v5", "ipfix"]);
        assert!(config.netflow.share_templates);
        // 나머지는 기본값 유지
        assert_eq!(config.netflow.pending_cleanup_interval_secs, 60);
        assert_eq!(config.general.log_format, "json");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = FlowpostConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            FlowpostError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = FlowpostConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_unknown_protocol() {
        let mut config = FlowpostConfig::default();
        config.netflow.protocols = vec!["v5".to_owned(), "sflow".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sflow"));
    }

    #[test]
    fn validate_rejects_duplicate_protocol() {
        let mut config = FlowpostConfig::default();
        config.netflow.protocols = vec!["v9".to_owned(), "v9".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn validate_rejects_empty_protocols() {
        let mut config = FlowpostConfig::default();
        config.netflow.protocols.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_pending_interval_when_caching() {
        let mut config = FlowpostConfig::default();
        config.netflow.pending_cleanup_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pending_cleanup_interval_secs"));
    }

    #[test]
    fn validate_accepts_zero_pending_interval_without_cache() {
        let mut config = FlowpostConfig::default();
        config.netflow.cache_unknown_templates = false;
        config.netflow.pending_cleanup_interval_secs = 0;
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_reset_threshold() {
        let mut config = FlowpostConfig::default();
        config.netflow.sequence_reset_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_override_bool_valid() {
        let mut val = false;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_FLOWPOST_BOOL", "true") };
        override_bool(&mut val, "TEST_FLOWPOST_BOOL");
        assert!(val);
        unsafe { std::env::remove_var("TEST_FLOWPOST_BOOL") };
    }

    #[test]
    #[serial]
    fn env_override_u64_invalid_keeps_original() {
        let mut val = 42u64;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_FLOWPOST_U64_BAD", "forty") };
        override_u64(&mut val, "TEST_FLOWPOST_U64_BAD");
        assert_eq!(val, 42);
        unsafe { std::env::remove_var("TEST_FLOWPOST_U64_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_csv_skips_empty_entries() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_FLOWPOST_CSV", "v5, ,ipfix,") };
        override_csv(&mut val, "TEST_FLOWPOST_CSV");
        assert_eq!(val, vec!["v5", "ipfix"]);
        unsafe { std::env::remove_var("TEST_FLOWPOST_CSV") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_updates_netflow_section() {
        let mut config = FlowpostConfig::default();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe {
            std::env::set_var("FLOWPOST_NETFLOW_SHARE_TEMPLATES", "true");
            std::env::set_var("FLOWPOST_NETFLOW_SEQUENCE_RESET_THRESHOLD", "5000");
        }
        config.apply_env_overrides();
        unsafe {
            std::env::remove_var("FLOWPOST_NETFLOW_SHARE_TEMPLATES");
            std::env::remove_var("FLOWPOST_NETFLOW_SEQUENCE_RESET_THRESHOLD");
        }
        assert!(config.netflow.share_templates);
        assert_eq!(config.netflow.sequence_reset_threshold, 5000);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = FlowpostConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = FlowpostConfig::parse(&toml_str).unwrap();
        assert_eq!(config.netflow.protocols, parsed.netflow.protocols);
        assert_eq!(
            config.netflow.pending_removal_threshold_secs,
            parsed.netflow.pending_removal_threshold_secs
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = FlowpostConfig::from_file("/nonexistent/path/flowpost.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FlowpostError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
