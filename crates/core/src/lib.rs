//! Flowpost 공통 기반 -- 에러, 설정, 메트릭, 로깅, 생명주기 trait
//!
//! 도메인 크레이트(`flowpost-netflow`)가 공유하는 타입을 모아 둡니다.
//!
//! ```text
//! flowpost-core
//!   ├── error     FlowpostError 계층
//!   ├── config    flowpost.toml + FLOWPOST_* 환경변수
//!   ├── metrics   메트릭 이름 상수
//!   ├── logging   tracing-subscriber 초기화
//!   └── pipeline  Pipeline trait, HealthStatus
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

// 에러
pub use error::{ConfigError, DecodeError, FlowpostError, PipelineError};

// 설정
pub use config::{FlowpostConfig, GeneralConfig, NetflowConfig};

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};
