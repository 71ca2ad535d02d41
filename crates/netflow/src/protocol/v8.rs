//! NetFlow v8 (라우터 기반 집계) 디코더
//!
//! 헤더의 집계 유형 바이트가 14개 고정 레코드 형식 중 하나를 고릅니다.
//! 알 수 없는 집계 유형은 에러이며 레코드를 만들지 않습니다.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};

use bytes::{Buf, Bytes};

use crate::config::DecoderConfig;
use crate::error::{NetflowError, ensure_remaining};
use crate::fields::{Decoder as D, FieldDict};
use crate::record::{FieldValue, Record};
use crate::template::{FieldTemplate as F, Template};

use super::{Protocol, exporter_metadata, stamp_records, unix_time};

/// v8 헤더 길이
const HEADER_LEN: usize = 28;

/// v8 집계 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Aggregation {
    RouterAs = 1,
    RouterProtoPort = 2,
    RouterSrcPrefix = 3,
    RouterDstPrefix = 4,
    RouterPrefix = 5,
    DestOnly = 6,
    SrcDst = 7,
    FullFlow = 8,
    TosAs = 9,
    TosProtoPort = 10,
    TosSrcPrefix = 11,
    TosDstPrefix = 12,
    TosPrefix = 13,
    PrePortProtocol = 14,
}

impl Aggregation {
    /// 모든 집계 유형 (번호 순)
    pub const ALL: [Aggregation; 14] = [
        Self::RouterAs,
        Self::RouterProtoPort,
        Self::RouterSrcPrefix,
        Self::RouterDstPrefix,
        Self::RouterPrefix,
        Self::DestOnly,
        Self::SrcDst,
        Self::FullFlow,
        Self::TosAs,
        Self::TosProtoPort,
        Self::TosSrcPrefix,
        Self::TosDstPrefix,
        Self::TosPrefix,
        Self::PrePortProtocol,
    ];

    /// 헤더 바이트에서 집계 유형을 찾습니다.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|a| *a as u8 == value)
    }

    /// 집계 유형의 레코드 템플릿
    pub fn template(self) -> &'static Template {
        &TEMPLATES[usize::from(self as u8 - 1)]
    }

    fn fields(self) -> Vec<F> {
        match self {
            Self::RouterAs => {
                let mut fields = counters();
                fields.extend(as_and_interfaces());
                fields
            }
            Self::RouterProtoPort => {
                let mut fields = counters();
                fields.extend([
                    F::known(1, "protocolIdentifier", D::Unsigned8),
                    F::padding(3),
                    F::known(2, "sourceTransportPort", D::Unsigned16),
                    F::known(2, "destinationTransportPort", D::Unsigned16),
                ]);
                fields
            }
            Self::RouterSrcPrefix => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "sourceIPv4Prefix", D::Ipv4Address),
                    F::padding(2),
                    F::known(2, "bgpSourceAsNumber", D::Unsigned32),
                    F::known(2, "ingressInterface", D::Unsigned32),
                    F::padding(2),
                ]);
                fields
            }
            Self::RouterDstPrefix => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "destinationIPv4Prefix", D::Ipv4Address),
                    F::padding(2),
                    F::known(2, "bgpDestinationAsNumber", D::Unsigned32),
                    F::known(2, "egressInterface", D::Unsigned32),
                    F::padding(2),
                ]);
                fields
            }
            Self::RouterPrefix => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "sourceIPv4Prefix", D::Ipv4Address),
                    F::known(4, "destinationIPv4Prefix", D::Ipv4Address),
                    F::padding(4),
                ]);
                fields.extend(as_and_interfaces());
                fields
            }
            Self::DestOnly => vec![
                F::known(4, "destinationIPv4Address", D::Ipv4Address),
                F::known(4, "packetDeltaCount", D::Unsigned64),
                F::known(4, "octetDeltaCount", D::Unsigned64),
                F::known(4, "flowStartSysUpTime", D::Unsigned32),
                F::known(4, "flowEndSysUpTime", D::Unsigned32),
                F::known(2, "egressInterface", D::Unsigned32),
                F::known(1, "ipClassOfService", D::Unsigned8),
                F::known(1, "postIpClassOfService", D::Unsigned8),
                F::known(4, "droppedPacketDeltaCount", D::Unsigned64),
                F::known(4, "ipv4RouterSc", D::Ipv4Address),
            ],
            Self::SrcDst => vec![
                F::known(4, "destinationIPv4Address", D::Ipv4Address),
                F::known(4, "sourceIPv4Address", D::Ipv4Address),
                F::known(4, "packetDeltaCount", D::Unsigned64),
                F::known(4, "octetDeltaCount", D::Unsigned64),
                F::known(4, "flowStartSysUpTime", D::Unsigned32),
                F::known(4, "flowEndSysUpTime", D::Unsigned32),
                F::known(2, "egressInterface", D::Unsigned32),
                F::known(2, "ingressInterface", D::Unsigned32),
                F::known(1, "ipClassOfService", D::Unsigned8),
                F::known(1, "postIpClassOfService", D::Unsigned8),
                F::padding(2),
                F::known(4, "droppedPacketDeltaCount", D::Unsigned64),
                F::known(4, "ipv4RouterSc", D::Ipv4Address),
            ],
            Self::FullFlow => vec![
                F::known(4, "destinationIPv4Address", D::Ipv4Address),
                F::known(4, "sourceIPv4Address", D::Ipv4Address),
                F::known(2, "destinationTransportPort", D::Unsigned16),
                F::known(2, "sourceTransportPort", D::Unsigned16),
                F::known(4, "packetDeltaCount", D::Unsigned64),
                F::known(4, "octetDeltaCount", D::Unsigned64),
                F::known(4, "flowStartSysUpTime", D::Unsigned32),
                F::known(4, "flowEndSysUpTime", D::Unsigned32),
                F::known(2, "egressInterface", D::Unsigned32),
                F::known(2, "ingressInterface", D::Unsigned32),
                F::known(1, "ipClassOfService", D::Unsigned8),
                F::known(1, "protocolIdentifier", D::Unsigned8),
                F::known(1, "postIpClassOfService", D::Unsigned8),
                F::padding(1),
                F::known(4, "droppedPacketDeltaCount", D::Unsigned64),
                F::known(4, "ipv4RouterSc", D::Ipv4Address),
            ],
            Self::TosAs => {
                let mut fields = counters();
                fields.extend(as_and_interfaces());
                fields.extend([F::known(1, "ipClassOfService", D::Unsigned8), F::padding(3)]);
                fields
            }
            Self::TosProtoPort => {
                let mut fields = counters();
                fields.extend([
                    F::known(1, "protocolIdentifier", D::Unsigned8),
                    F::known(1, "ipClassOfService", D::Unsigned8),
                    F::padding(2),
                    F::known(2, "sourceTransportPort", D::Unsigned16),
                    F::known(2, "destinationTransportPort", D::Unsigned16),
                    F::known(2, "ingressInterface", D::Unsigned32),
                    F::known(2, "egressInterface", D::Unsigned32),
                ]);
                fields
            }
            Self::TosSrcPrefix => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "sourceIPv4Prefix", D::Ipv4Address),
                    F::known(1, "sourceIPv4PrefixLength", D::Unsigned8),
                    F::known(1, "ipClassOfService", D::Unsigned8),
                    F::known(2, "bgpSourceAsNumber", D::Unsigned32),
                    F::known(2, "ingressInterface", D::Unsigned32),
                    F::padding(2),
                ]);
                fields
            }
            Self::TosDstPrefix => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "destinationIPv4Prefix", D::Ipv4Address),
                    F::known(1, "destinationIPv4PrefixLength", D::Unsigned8),
                    F::known(1, "ipClassOfService", D::Unsigned8),
                    F::known(2, "bgpDestinationAsNumber", D::Unsigned32),
                    F::known(2, "egressInterface", D::Unsigned32),
                    F::padding(2),
                ]);
                fields
            }
            Self::TosPrefix => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "sourceIPv4Prefix", D::Ipv4Address),
                    F::known(4, "destinationIPv4Prefix", D::Ipv4Address),
                    F::known(1, "destinationIPv4PrefixLength", D::Unsigned8),
                    F::known(1, "sourceIPv4PrefixLength", D::Unsigned8),
                    F::known(1, "ipClassOfService", D::Unsigned8),
                    F::padding(1),
                ]);
                fields.extend(as_and_interfaces());
                fields
            }
            Self::PrePortProtocol => {
                let mut fields = counters();
                fields.extend([
                    F::known(4, "sourceIPv4Prefix", D::Ipv4Address),
                    F::known(4, "destinationIPv4Prefix", D::Ipv4Address),
                    F::known(1, "destinationIPv4PrefixLength", D::Unsigned8),
                    F::known(1, "sourceIPv4PrefixLength", D::Unsigned8),
                    F::known(1, "ipClassOfService", D::Unsigned8),
                    F::known(1, "protocolIdentifier", D::Unsigned8),
                    F::known(2, "sourceTransportPort", D::Unsigned16),
                    F::known(2, "destinationTransportPort", D::Unsigned16),
                    F::known(2, "ingressInterface", D::Unsigned32),
                    F::known(2, "egressInterface", D::Unsigned32),
                ]);
                fields
            }
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

static TEMPLATES: LazyLock<Vec<Template>> = LazyLock::new(|| {
    Aggregation::ALL
        .into_iter()
        .map(|aggregation| Template::new(0, aggregation.fields()))
        .collect()
});

/// 집계 레코드 공통 카운터 (20바이트)
fn counters() -> Vec<F> {
    vec![
        F::known(4, "deltaFlowCount", D::Unsigned64),
        F::known(4, "packetDeltaCount", D::Unsigned64),
        F::known(4, "octetDeltaCount", D::Unsigned64),
        F::known(4, "flowStartSysUpTime", D::Unsigned32),
        F::known(4, "flowEndSysUpTime", D::Unsigned32),
    ]
}

fn as_and_interfaces() -> [F; 4] {
    [
        F::known(2, "bgpSourceAsNumber", D::Unsigned32),
        F::known(2, "bgpDestinationAsNumber", D::Unsigned32),
        F::known(2, "ingressInterface", D::Unsigned32),
        F::known(2, "egressInterface", D::Unsigned32),
    ]
}

/// NetFlow v8 디코더
#[derive(Debug, Default)]
pub struct V8Protocol;

impl V8Protocol {
    /// 디코더를 생성합니다.
    pub fn new() -> Self {
        Self
    }
}

impl Protocol for V8Protocol {
    fn name(&self) -> &'static str {
        "v8"
    }

    fn version(&self) -> u16 {
        8
    }

    fn on_packet(&self, packet: Bytes, source: SocketAddr) -> Result<Vec<Record>, NetflowError> {
        let mut buf = packet;
        ensure_remaining(&buf, HEADER_LEN, "v8 header")?;

        let version = buf.get_u16();
        let count = buf.get_u16();
        let uptime = buf.get_u32();
        let secs = buf.get_u32();
        let nanos = buf.get_u32();
        let _sequence = buf.get_u32();
        let engine_type = buf.get_u8();
        let engine_id = buf.get_u8();
        let aggregation_code = buf.get_u8();
        let aggregation_version = buf.get_u8();
        buf.advance(4);

        let Some(aggregation) = Aggregation::from_u8(aggregation_code) else {
            tracing::warn!(
                exporter = %source,
                aggregation = aggregation_code,
                "packet uses an unknown v8 aggregation"
            );
            return Err(NetflowError::UnknownAggregation(aggregation_code));
        };

        let timestamp = unix_time(secs, nanos);
        let mut exporter = exporter_metadata(version, timestamp, Some(uptime), source);
        for (key, value) in [
            ("engineType", engine_type),
            ("engineId", engine_id),
            ("aggregation", aggregation_code),
            ("aggregationVersion", aggregation_version),
        ] {
            exporter.insert(key.to_owned(), FieldValue::Unsigned(u64::from(value)));
        }

        let mut records = aggregation.template().apply(&mut buf, usize::from(count))?;
        stamp_records(&mut records, timestamp, &exporter);
        Ok(records)
    }
}

/// v8 팩토리
pub fn new_v8(_config: &DecoderConfig, _fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(V8Protocol::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::Ipv4Addr;

    use chrono::{DateTime, Utc};

    use crate::record::{FieldMap, RecordType};

    const HEADER: [u16; 14] = [
        8, 1, 1, 2, 23543, 5935, 15070, 26801, 0x1234, 0x5678, 258, 0, 0, 0,
    ];

    fn address() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 11111))
    }

    fn capture_time() -> DateTime<Utc> {
        "2018-11-22T20:53:03.987654321Z".parse().unwrap()
    }

    fn packet(aggregation: u8, record: &[u16]) -> Bytes {
        let mut raw: Vec<u8> = HEADER
            .iter()
            .chain(record)
            .flat_map(|w| w.to_be_bytes())
            .collect();
        raw[22] = aggregation;
        Bytes::from(raw)
    }

    fn decode_one(aggregation: Aggregation, record: &[u16]) -> Record {
        let mut records = V8Protocol::new()
            .on_packet(packet(aggregation as u8, record), address())
            .unwrap();
        assert_eq!(records.len(), 1);
        records.remove(0)
    }

    fn unsigned(pairs: &[(&str, u64)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), FieldValue::Unsigned(*v)))
            .collect()
    }

    const COMMON: [u16; 10] = [
        0x1234, 0x5678, 0x09ab, 0xcdef, 0x1122, 0x3344, 0x5566, 0x7788, 0x99aa, 0x99bb,
    ];

    fn common_counters() -> FieldMap {
        unsigned(&[
            ("deltaFlowCount", 0x12345678),
            ("packetDeltaCount", 0x09abcdef),
            ("octetDeltaCount", 0x11223344),
            ("flowStartSysUpTime", 0x55667788),
            ("flowEndSysUpTime", 0x99aa99bb),
        ])
    }

    #[test]
    fn template_lengths() {
        let expected = [28, 28, 32, 32, 40, 32, 40, 44, 32, 32, 32, 32, 40, 40];
        for (aggregation, length) in Aggregation::ALL.into_iter().zip(expected) {
            let template = aggregation.template();
            assert_eq!(template.length, length, "{aggregation}");
            template.validate().unwrap();
        }
    }

    #[test]
    fn aggregation_codes() {
        assert_eq!(Aggregation::from_u8(1), Some(Aggregation::RouterAs));
        assert_eq!(Aggregation::from_u8(14), Some(Aggregation::PrePortProtocol));
        assert_eq!(Aggregation::from_u8(0), None);
        assert_eq!(Aggregation::from_u8(15), None);
    }

    #[test]
    fn router_as() {
        let mut record_words = COMMON.to_vec();
        record_words.extend([0x1111, 0x2222, 0x3333, 0x4444]);
        let record = decode_one(Aggregation::RouterAs, &record_words);

        let mut expected = common_counters();
        expected.extend(unsigned(&[
            ("bgpSourceAsNumber", 0x1111),
            ("bgpDestinationAsNumber", 0x2222),
            ("ingressInterface", 0x3333),
            ("egressInterface", 0x4444),
        ]));
        assert_eq!(record.record_type, RecordType::Flow);
        assert_eq!(record.fields, expected);
        assert_eq!(record.timestamp, capture_time());

        let mut exporter = unsigned(&[
            ("version", 8),
            ("uptimeMillis", 0x10002),
            ("engineType", 1),
            ("engineId", 2),
            ("aggregation", 1),
            ("aggregationVersion", 0),
        ]);
        exporter.insert("timestamp".to_owned(), FieldValue::Timestamp(capture_time()));
        exporter.insert(
            "address".to_owned(),
            FieldValue::String("127.0.0.1:11111".to_owned()),
        );
        assert_eq!(record.exporter, exporter);
    }

    #[test]
    fn router_proto_port() {
        let mut record_words = COMMON.to_vec();
        record_words.extend([0x1111, 0x2222, 0x3333, 0x4444]);
        let record = decode_one(Aggregation::RouterProtoPort, &record_words);

        let mut expected = common_counters();
        expected.extend(unsigned(&[
            ("protocolIdentifier", 0x11),
            ("sourceTransportPort", 0x3333),
            ("destinationTransportPort", 0x4444),
        ]));
        assert_eq!(record.fields, expected);
    }

    #[test]
    fn router_dst_prefix() {
        let mut record_words = COMMON.to_vec();
        record_words.extend([0x1111, 0x2222, 0x3333, 0x4444, 0x0506, 0]);
        let record = decode_one(Aggregation::RouterDstPrefix, &record_words);

        let mut expected = common_counters();
        expected.extend(unsigned(&[
            ("bgpDestinationAsNumber", 0x4444),
            ("egressInterface", 0x0506),
        ]));
        expected.insert(
            "destinationIPv4Prefix".to_owned(),
            FieldValue::from(Ipv4Addr::new(17, 17, 34, 34)),
        );
        assert_eq!(record.fields, expected);
    }

    #[test]
    fn router_prefix() {
        let mut record_words = COMMON.to_vec();
        record_words.extend([
            0x1111, 0x2222, 0x3333, 0x4444, 0, 0, 0x0506, 0x0708, 0x090a, 0x0b0c,
        ]);
        let record = decode_one(Aggregation::RouterPrefix, &record_words);

        let mut expected = common_counters();
        expected.extend(unsigned(&[
            ("bgpSourceAsNumber", 0x0506),
            ("bgpDestinationAsNumber", 0x0708),
            ("ingressInterface", 0x090a),
            ("egressInterface", 0x0b0c),
        ]));
        expected.insert(
            "sourceIPv4Prefix".to_owned(),
            FieldValue::from(Ipv4Addr::new(17, 17, 34, 34)),
        );
        expected.insert(
            "destinationIPv4Prefix".to_owned(),
            FieldValue::from(Ipv4Addr::new(51, 51, 68, 68)),
        );
        assert_eq!(record.fields, expected);
    }

    #[test]
    fn full_flow() {
        let mut record_words = COMMON.to_vec();
        record_words.extend([
            0x1111, 0x2222, 0x3333, 0x4444, 0x5555, 0x6666, 0x7181, 0x91a1, 0xb1c1, 0xd1e1,
            0x2f2e, 0x2d2c,
        ]);
        let record = decode_one(Aggregation::FullFlow, &record_words);

        let mut expected = unsigned(&[
            ("destinationTransportPort", 0x1122),
            ("sourceTransportPort", 0x3344),
            ("packetDeltaCount", 0x55667788),
            ("octetDeltaCount", 0x99aa99bb),
            ("flowStartSysUpTime", 0x11112222),
            ("flowEndSysUpTime", 0x33334444),
            ("egressInterface", 0x5555),
            ("ingressInterface", 0x6666),
            ("ipClassOfService", 0x71),
            ("protocolIdentifier", 0x81),
            ("postIpClassOfService", 0x91),
            ("droppedPacketDeltaCount", 0xb1c1d1e1),
        ]);
        for (name, ip) in [
            ("destinationIPv4Address", Ipv4Addr::new(18, 52, 86, 120)),
            ("sourceIPv4Address", Ipv4Addr::new(9, 171, 205, 239)),
            ("ipv4RouterSc", Ipv4Addr::new(47, 46, 45, 44)),
        ] {
            expected.insert(name.to_owned(), FieldValue::from(ip));
        }
        assert_eq!(record.fields, expected);
    }

    #[test]
    fn tos_as() {
        let mut record_words = COMMON.to_vec();
        record_words.extend([0x1111, 0x2222, 0x3333, 0x4444, 0x5555, 0x6666]);
        let record = decode_one(Aggregation::TosAs, &record_words);
        assert_eq!(
            record.get("ipClassOfService"),
            Some(&FieldValue::Unsigned(0x55))
        );
        assert_eq!(record.fields.len(), 10);
    }

    #[test]
    fn unknown_aggregation_is_an_error() {
        let record_words = [0u16; 22];
        let err = V8Protocol::new()
            .on_packet(packet(0xff, &record_words), address())
            .unwrap_err();
        assert!(matches!(err, NetflowError::UnknownAggregation(0xff)));
        assert_eq!(err.to_string(), "unsupported v8 aggregation: 255");
    }

    #[test]
    fn short_header_is_an_error() {
        let raw = Bytes::from_static(&[
            0x00, 0x08, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x5b, 0xf6, 0x89, 0xf6, 0x05,
        ]);
        let err = V8Protocol::new().on_packet(raw, address()).unwrap_err();
        assert!(err.is_eof());
    }
}
