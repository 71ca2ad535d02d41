//! 디코더 파사드 -- 패킷 버전으로 프로토콜을 골라 디코딩합니다.
//!
//! [`Decoder`]는 core의 [`Pipeline`](flowpost_core::pipeline::Pipeline) trait을 구현하여
//! 다른 모듈과 같은 생명주기(start/stop/health_check)로 관리됩니다.
//! `start`는 v9/IPFIX의 세션 만료와 미확인 템플릿 캐시 정리 작업을 띄웁니다.
//!
//! # 사용 예시
//! ```ignore
//! use flowpost_netflow::{Decoder, DecoderConfig};
//! use flowpost_core::pipeline::Pipeline;
//!
//! let mut decoder = Decoder::from_config(DecoderConfig::default()).await?;
//! decoder.start().await?;
//!
//! let records = decoder.read(packet, source)?;
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use flowpost_core::error::{FlowpostError, PipelineError};
use flowpost_core::metrics as m;
use flowpost_core::pipeline::{HealthStatus, Pipeline};

use crate::config::DecoderConfig;
use crate::error::NetflowError;
use crate::fields::{FieldDict, custom, default_fields};
use crate::protocol::{Protocol, ProtocolRegistry};
use crate::record::Record;

/// 디코더 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// 생성됨, 아직 시작하지 않음
    Initialized,
    /// 백그라운드 작업 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 버전별 프로토콜 디코더 묶음
pub struct Decoder {
    config: DecoderConfig,
    fields: Arc<FieldDict>,
    protocols: HashMap<u16, Box<dyn Protocol>>,
    state: DecoderState,
}

impl Decoder {
    /// 설정의 사용자 정의 필드 파일을 읽고 디코더를 만듭니다.
    pub async fn from_config(config: DecoderConfig) -> Result<Self, NetflowError> {
        config.validate()?;
        let custom_fields = custom::load_files(&config.custom_definitions).await?;
        DecoderBuilder::new()
            .config(config)
            .custom_fields(custom_fields)
            .build()
    }

    /// 패킷 하나를 디코딩합니다.
    ///
    /// 앞 2바이트의 버전에 맞는 프로토콜이 없으면 `UnsupportedVersion`입니다.
    pub fn read(&self, packet: Bytes, source: SocketAddr) -> Result<Vec<Record>, NetflowError> {
        let Some(version) = peek_version(&packet) else {
            return Err(NetflowError::UnexpectedEof {
                context: "packet version",
                needed: 2,
                remaining: packet.len(),
            });
        };

        let Some(protocol) = self.protocols.get(&version) else {
            metrics::counter!(m::NETFLOW_UNSUPPORTED_VERSION_TOTAL).increment(1);
            debug!(exporter = %source, version, "dropping packet with unsupported version");
            return Err(NetflowError::UnsupportedVersion(version));
        };

        let label = protocol.name();
        metrics::counter!(m::NETFLOW_PACKETS_RECEIVED_TOTAL, m::LABEL_VERSION => label)
            .increment(1);
        match protocol.on_packet(packet, source) {
            Ok(records) => {
                metrics::counter!(m::NETFLOW_RECORDS_DECODED_TOTAL, m::LABEL_VERSION => label)
                    .increment(records.len() as u64);
                Ok(records)
            }
            Err(e) => {
                metrics::counter!(m::NETFLOW_DECODE_ERRORS_TOTAL, m::LABEL_VERSION => label)
                    .increment(1);
                debug!(exporter = %source, protocol = label, error = %e, "failed to decode packet");
                Err(e)
            }
        }
    }

    /// 활성 버전 목록 (오름차순)
    pub fn versions(&self) -> Vec<u16> {
        let mut versions: Vec<u16> = self.protocols.keys().copied().collect();
        versions.sort_unstable();
        versions
    }

    /// 버전 번호로 프로토콜을 조회합니다.
    pub fn protocol(&self, version: u16) -> Option<&dyn Protocol> {
        self.protocols.get(&version).map(|p| p.as_ref())
    }

    /// 모든 프로토콜의 활성 세션 수 합계
    pub fn session_count(&self) -> usize {
        self.protocols.values().map(|p| p.session_count()).sum()
    }

    /// 디코더가 쓰는 필드 사전
    pub fn fields(&self) -> &Arc<FieldDict> {
        &self.fields
    }

    /// 디코더 설정
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// 현재 상태 이름
    pub fn state_name(&self) -> &str {
        match self.state {
            DecoderState::Initialized => "initialized",
            DecoderState::Running => "running",
            DecoderState::Stopped => "stopped",
        }
    }

    fn stop_protocols(&self) -> Result<(), NetflowError> {
        let mut result = Ok(());
        for protocol in self.protocols.values() {
            if let Err(e) = protocol.stop() {
                tracing::warn!(protocol = protocol.name(), error = %e, "failed to stop protocol");
                result = Err(e);
            }
        }
        result
    }
}

impl Pipeline for Decoder {
    async fn start(&mut self) -> Result<(), FlowpostError> {
        if self.state == DecoderState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(versions = ?self.versions(), "starting netflow decoder");
        for protocol in self.protocols.values() {
            if let Err(e) = protocol.start() {
                if let Err(rollback) = self.stop_protocols() {
                    debug!(error = %rollback, "rollback after failed start was incomplete");
                }
                return Err(e.into());
            }
        }

        self.state = DecoderState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), FlowpostError> {
        if self.state != DecoderState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping netflow decoder");
        self.state = DecoderState::Stopped;
        self.stop_protocols()?;
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            DecoderState::Running => HealthStatus::Healthy,
            DecoderState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            DecoderState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

fn peek_version(packet: &[u8]) -> Option<u16> {
    match packet {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}

/// 디코더 빌더
pub struct DecoderBuilder {
    config: DecoderConfig,
    registry: ProtocolRegistry,
    custom_fields: Vec<FieldDict>,
}

impl DecoderBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: DecoderConfig::default(),
            registry: ProtocolRegistry::with_defaults(),
            custom_fields: Vec::new(),
        }
    }

    /// 디코더 설정을 지정합니다.
    pub fn config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// 프로토콜 레지스트리를 바꿉니다.
    pub fn registry(mut self, registry: ProtocolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// 기본 사전 위에 얹을 사용자 정의 사전을 추가합니다. 나중 것이 이깁니다.
    pub fn custom_fields(mut self, dicts: impl IntoIterator<Item = FieldDict>) -> Self {
        self.custom_fields.extend(dicts);
        self
    }

    /// 디코더를 빌드합니다.
    pub fn build(self) -> Result<Decoder, NetflowError> {
        self.config.validate()?;

        let fields = Arc::new(FieldDict::with_overlays(
            default_fields(),
            &self.custom_fields,
        ));

        let mut protocols: HashMap<u16, Box<dyn Protocol>> = HashMap::new();
        for name in &self.config.protocols {
            let protocol = self.registry.create(name, &self.config, &fields)?;
            let version = protocol.version();
            if protocols.insert(version, protocol).is_some() {
                return Err(NetflowError::Config {
                    field: "protocols".to_owned(),
                    reason: format!("more than one protocol handles version {version}"),
                });
            }
        }

        debug!(
            fields = fields.len(),
            protocols = ?self.config.protocols,
            "netflow decoder built"
        );
        Ok(Decoder {
            config: self.config,
            fields,
            protocols,
            state: DecoderState::Initialized,
        })
    }
}

impl Default for DecoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
