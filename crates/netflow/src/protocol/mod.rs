//! 버전별 프로토콜 디코더
//!
//! 모든 버전은 [`Protocol`] 트레이트를 구현합니다. 디코더 파사드는
//! [`ProtocolRegistry`]에서 이름으로 팩토리를 찾아 인스턴스를 만들고,
//! 패킷 앞 2바이트(버전)로 인스턴스를 고릅니다.
//!
//! | 이름 | 버전 | 구현 |
//! |------|------|------|
//! | v1, v5, v6, v7 | 1, 5, 6, 7 | [`legacy::LegacyProtocol`] |
//! | v8 | 8 | [`v8::V8Protocol`] |
//! | v9 | 9 | [`dynamic::DynamicProtocol`] + [`v9::V9Decoder`] |
//! | ipfix | 10 | [`dynamic::DynamicProtocol`] + [`ipfix::IpfixDecoder`] |

pub mod dynamic;
pub mod ipfix;
pub mod legacy;
pub mod v8;
pub mod v9;

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::config::DecoderConfig;
use crate::error::NetflowError;
use crate::fields::FieldDict;
use crate::record::{FieldMap, FieldValue, Record};

/// 프로토콜 버전 하나의 디코더
pub trait Protocol: Send + Sync {
    /// 설정에서 쓰는 이름 (예: `"v9"`, `"ipfix"`)
    fn name(&self) -> &'static str;

    /// 패킷 헤더의 버전 번호
    fn version(&self) -> u16;

    /// 패킷 하나를 디코딩합니다.
    fn on_packet(&self, packet: Bytes, source: SocketAddr) -> Result<Vec<Record>, NetflowError>;

    /// 백그라운드 작업을 시작합니다. tokio 런타임 안에서 호출해야 합니다.
    fn start(&self) -> Result<(), NetflowError> {
        Ok(())
    }

    /// 백그라운드 작업에 종료를 알립니다.
    fn stop(&self) -> Result<(), NetflowError> {
        Ok(())
    }

    /// 활성 세션 수 (상태 없는 프로토콜은 0)
    fn session_count(&self) -> usize {
        0
    }
}

/// 프로토콜 인스턴스 생성 함수
pub type ProtocolFactory = fn(&DecoderConfig, &Arc<FieldDict>) -> Box<dyn Protocol>;

/// 레지스트리 항목
#[derive(Debug, Clone, Copy)]
pub struct ProtocolEntry {
    /// 프로토콜 이름
    pub name: &'static str,
    /// 버전 번호
    pub version: u16,
    /// 팩토리
    pub factory: ProtocolFactory,
}

/// 프로토콜 이름 → 팩토리
///
/// 등록 순서가 보존됩니다. 이름과 버전은 각각 유일해야 합니다.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    entries: Vec<ProtocolEntry>,
}

impl ProtocolRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 기본 7개 프로토콜이 등록된 레지스트리를 생성합니다.
    pub fn with_defaults() -> Self {
        let entries = vec![
            ProtocolEntry {
                name: "v1",
                version: 1,
                factory: legacy::new_v1,
            },
            ProtocolEntry {
                name: "v5",
                version: 5,
                factory: legacy::new_v5,
            },
            ProtocolEntry {
                name: "v6",
                version: 6,
                factory: legacy::new_v6,
            },
            ProtocolEntry {
                name: "v7",
                version: 7,
                factory: legacy::new_v7,
            },
            ProtocolEntry {
                name: "v8",
                version: 8,
                factory: v8::new_v8,
            },
            ProtocolEntry {
                name: "v9",
                version: 9,
                factory: v9::new_v9,
            },
            ProtocolEntry {
                name: "ipfix",
                version: 10,
                factory: ipfix::new_ipfix,
            },
        ];
        Self { entries }
    }

    /// 프로토콜을 등록합니다. 이름이나 버전이 겹치면 에러를 반환합니다.
    pub fn register(
        &mut self,
        name: &'static str,
        version: u16,
        factory: ProtocolFactory,
    ) -> Result<(), NetflowError> {
        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.name == name || e.version == version)
        {
            return Err(NetflowError::Config {
                field: "protocols".to_owned(),
                reason: format!(
                    "protocol '{name}' (version {version}) conflicts with registered '{}' (version {})",
                    existing.name, existing.version
                ),
            });
        }
        self.entries.push(ProtocolEntry {
            name,
            version,
            factory,
        });
        Ok(())
    }

    /// 이름으로 항목을 조회합니다.
    pub fn get(&self, name: &str) -> Option<&ProtocolEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// 등록된 이름 목록
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// 이름으로 프로토콜 인스턴스를 생성합니다.
    pub fn create(
        &self,
        name: &str,
        config: &DecoderConfig,
        fields: &Arc<FieldDict>,
    ) -> Result<Box<dyn Protocol>, NetflowError> {
        let entry = self
            .get(name)
            .ok_or_else(|| NetflowError::UnknownProtocol(name.to_owned()))?;
        Ok((entry.factory)(config, fields))
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// 모든 버전에 공통인 exporter 메타데이터를 만듭니다.
///
/// `uptime_millis`가 없는 버전(IPFIX)은 `uptimeMillis` 키를 넣지 않습니다.
pub(crate) fn exporter_metadata(
    version: u16,
    timestamp: DateTime<Utc>,
    uptime_millis: Option<u32>,
    source: SocketAddr,
) -> FieldMap {
    let mut exporter = FieldMap::new();
    exporter.insert("version".to_owned(), FieldValue::Unsigned(u64::from(version)));
    exporter.insert("timestamp".to_owned(), FieldValue::Timestamp(timestamp));
    if let Some(uptime) = uptime_millis {
        exporter.insert("uptimeMillis".to_owned(), FieldValue::Unsigned(u64::from(uptime)));
    }
    exporter.insert("address".to_owned(), FieldValue::String(source.to_string()));
    exporter
}

/// 레코드마다 헤더 시각과 exporter 메타데이터를 채웁니다.
pub(crate) fn stamp_records(records: &mut [Record], timestamp: DateTime<Utc>, exporter: &FieldMap) {
    for record in records {
        record.timestamp = timestamp;
        record.exporter = exporter.clone();
    }
}

/// 유닉스 초 + 나노초를 UTC 시각으로 변환합니다. 10^9 이상의 나노초는 초로 올립니다.
pub(crate) fn unix_time(secs: u32, nanos: u32) -> DateTime<Utc> {
    let secs = i64::from(secs) + i64::from(nanos / NANOS_PER_SEC);
    DateTime::from_timestamp(secs, nanos % NANOS_PER_SEC).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

const NANOS_PER_SEC: u32 = 1_000_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_versions() {
        let registry = ProtocolRegistry::with_defaults();
        assert_eq!(
            registry.names(),
            vec!["v1", "v5", "v6", "v7", "v8", "v9", "ipfix"]
        );
        assert_eq!(registry.get("ipfix").map(|e| e.version), Some(10));
        assert!(registry.get("sflow").is_none());
    }

    #[test]
    fn create_builds_matching_version() {
        let registry = ProtocolRegistry::default();
        let config = DecoderConfig::default();
        let fields = Arc::new(crate::fields::default_fields().clone());
        for entry in ProtocolRegistry::with_defaults().entries {
            let protocol = registry.create(entry.name, &config, &fields).unwrap();
            assert_eq!(protocol.version(), entry.version);
            assert_eq!(protocol.name(), entry.name);
        }
    }

    #[test]
    fn create_unknown_protocol_fails() {
        let registry = ProtocolRegistry::default();
        let fields = Arc::new(FieldDict::new());
        let err = registry
            .create("sflow", &DecoderConfig::default(), &fields)
            .err()
            .unwrap();
        assert!(matches!(err, NetflowError::UnknownProtocol(_)));
    }

    #[test]
    fn register_rejects_conflicts() {
        let mut registry = ProtocolRegistry::with_defaults();
        assert!(registry.register("v9", 99, v9::new_v9).is_err());
        assert!(registry.register("v9-copy", 9, v9::new_v9).is_err());
        registry.register("v9-alt", 99, v9::new_v9).unwrap();
        assert!(registry.get("v9-alt").is_some());
    }

    #[test]
    fn unix_time_conversion() {
        let t = unix_time(0x5bf689f6, 0x1234);
        assert_eq!(t.timestamp(), 0x5bf689f6);
        assert_eq!(t.timestamp_subsec_nanos(), 0x1234);

        let carried = unix_time(10, 2_500_000_000);
        assert_eq!(carried.timestamp(), 12);
        assert_eq!(carried.timestamp_subsec_nanos(), 500_000_000);
    }
}
