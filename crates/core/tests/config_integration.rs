//! flowpost.toml 통합 설정 테스트
//!
//! - flowpost.toml.example 파싱 테스트
//! - 파일 로딩 + 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use std::io::Write;

use serial_test::serial;

use flowpost_core::config::FlowpostConfig;
use flowpost_core::error::{ConfigError, FlowpostError};

// =============================================================================
// flowpost.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../flowpost.toml.example");
    let config = FlowpostConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(
        config.netflow.protocols,
        vec!["v1", "v5", "v6", "v7", "v8", "v9", "ipfix"]
    );
    assert_eq!(config.netflow.expiration_timeout_secs, 1800);
    assert_eq!(config.netflow.pending_removal_threshold_secs, 300);
    assert!(config.netflow.custom_definitions.is_empty());
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../flowpost.toml.example");
    let config = FlowpostConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
#[serial]
async fn load_applies_env_overrides_over_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[netflow]\nshare_templates = false\nprotocols = [\"v9\"]").unwrap();

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("FLOWPOST_NETFLOW_SHARE_TEMPLATES", "true") };
    let config = FlowpostConfig::load(file.path()).await;
    unsafe { std::env::remove_var("FLOWPOST_NETFLOW_SHARE_TEMPLATES") };

    let config = config.expect("config should load");
    assert!(config.netflow.share_templates);
    assert_eq!(config.netflow.protocols, vec!["v9"]);
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_env_override() {
    let file = tempfile::NamedTempFile::new().unwrap();

    // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
    unsafe { std::env::set_var("FLOWPOST_NETFLOW_PROTOCOLS", "v5,netflow-lite") };
    let result = FlowpostConfig::load(file.path()).await;
    unsafe { std::env::remove_var("FLOWPOST_NETFLOW_PROTOCOLS") };

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        FlowpostError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[general]\nlog_format = \"xml\"").unwrap();

    let err = FlowpostConfig::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("log_format"));
}
