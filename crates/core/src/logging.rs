//! Logging initialization.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `FlowpostConfig`. Supports JSON structured logging and
//! human-readable pretty format.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::GeneralConfig;
use crate::error::{ConfigError, FlowpostError, PipelineError};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. Calling this twice
/// returns an error instead of panicking.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default for production)
/// * `"pretty"` - Human-readable colored output (for development)
pub fn init_tracing(config: &GeneralConfig) -> Result<(), FlowpostError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        other => {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("unknown log format '{other}', expected 'json' or 'pretty'"),
            }
            .into());
        }
    };

    result.map_err(|e| {
        PipelineError::InitFailed(format!("failed to initialize tracing subscriber: {e}")).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn rejects_unknown_format() {
        let config = GeneralConfig {
            log_level: "info".to_owned(),
            log_format: "xml".to_owned(),
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    #[serial]
    fn second_init_returns_error() {
        let config = GeneralConfig {
            log_level: "debug".to_owned(),
            log_format: "pretty".to_owned(),
        };
        // 첫 호출은 다른 테스트가 먼저 설치했을 수도 있으므로 결과를 따지지 않음
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
