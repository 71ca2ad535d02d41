//! NetFlow v1/v5/v6/v7 디코더
//!
//! 네 버전 모두 고정 헤더 뒤에 고정 길이 레코드가 `count`개 이어집니다.
//! 버전별 차이는 헤더 꼬리와 레코드 템플릿뿐이라 하나의 구현을 공유합니다.
//!
//! | 버전 | 헤더 | 레코드 |
//! |------|------|--------|
//! | v1 | 16 | 48 |
//! | v5 | 24 (sequence, engine, sampling) | 48 |
//! | v6 | 24 (v5와 동일) | 52 |
//! | v7 | 24 (sequence, reserved) | 52 |

use std::net::SocketAddr;
use std::sync::{Arc, LazyLock};

use bytes::{Buf, Bytes};

use crate::config::DecoderConfig;
use crate::error::{NetflowError, ensure_remaining};
use crate::fields::{Decoder as D, FieldDict};
use crate::record::{FieldValue, Record};
use crate::template::{FieldTemplate as F, Template};

use super::{Protocol, exporter_metadata, stamp_records, unix_time};

/// 헤더 공통부: version, count, uptime, secs, nanos
const BASE_HEADER_LEN: usize = 16;
/// v5/v6/v7 헤더 확장부
const EXTENDED_HEADER_LEN: usize = 8;

/// 헤더 꼬리 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderTail {
    /// v1: 없음
    None,
    /// v5/v6: sequence(4) engineType(1) engineId(1) samplingInterval(2)
    Engine,
    /// v7: sequence(4) reserved(4)
    Reserved,
}

impl HeaderTail {
    fn len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Engine | Self::Reserved => EXTENDED_HEADER_LEN,
        }
    }
}

/// v1 레코드 (48바이트)
static V1_TEMPLATE: LazyLock<Template> = LazyLock::new(|| {
    let mut fields = common_prefix();
    fields.extend([
        F::padding(2),
        F::known(1, "protocolIdentifier", D::Unsigned8),
        F::known(1, "ipClassOfService", D::Unsigned8),
        F::known(1, "tcpControlBits", D::Unsigned16),
        F::padding(7),
    ]);
    Template::new(0, fields)
});

/// v5 레코드 (48바이트)
static V5_TEMPLATE: LazyLock<Template> = LazyLock::new(|| {
    let mut fields = v5_body();
    fields.push(F::padding(2));
    Template::new(0, fields)
});

/// v6 레코드 (52바이트): v5 + encapsulation 크기 2바이트 + 다음 홉 라우터
static V6_TEMPLATE: LazyLock<Template> = LazyLock::new(|| {
    let mut fields = v5_body();
    fields.extend([
        // in/out encapsulation size
        F::padding(1),
        F::padding(1),
        F::known(4, "bgpNextHopIPv4Address", D::Ipv4Address),
    ]);
    Template::new(0, fields)
});

/// v7 레코드 (52바이트)
static V7_TEMPLATE: LazyLock<Template> = LazyLock::new(|| {
    let mut fields = common_prefix();
    fields.extend([
        // flags1
        F::padding(1),
        F::known(1, "tcpControlBits", D::Unsigned16),
        F::known(1, "protocolIdentifier", D::Unsigned8),
        F::known(1, "ipClassOfService", D::Unsigned8),
        F::known(2, "bgpSourceAsNumber", D::Unsigned32),
        F::known(2, "bgpDestinationAsNumber", D::Unsigned32),
        F::known(1, "sourceIPv4PrefixLength", D::Unsigned8),
        F::known(1, "destinationIPv4PrefixLength", D::Unsigned8),
        // flags2
        F::padding(2),
        F::known(4, "ipv4RouterSc", D::Ipv4Address),
    ]);
    Template::new(0, fields)
});

/// 주소, 인터페이스, 카운터, 시각, 포트 (36바이트)
fn common_prefix() -> Vec<F> {
    vec![
        F::known(4, "sourceIPv4Address", D::Ipv4Address),
        F::known(4, "destinationIPv4Address", D::Ipv4Address),
        F::known(4, "ipNextHopIPv4Address", D::Ipv4Address),
        F::known(2, "ingressInterface", D::Unsigned32),
        F::known(2, "egressInterface", D::Unsigned32),
        F::known(4, "packetDeltaCount", D::Unsigned64),
        F::known(4, "octetDeltaCount", D::Unsigned64),
        F::known(4, "flowStartSysUpTime", D::Unsigned32),
        F::known(4, "flowEndSysUpTime", D::Unsigned32),
        F::known(2, "sourceTransportPort", D::Unsigned16),
        F::known(2, "destinationTransportPort", D::Unsigned16),
    ]
}

/// v5/v6 공통 본문 (46바이트)
fn v5_body() -> Vec<F> {
    let mut fields = common_prefix();
    fields.extend([
        F::padding(1),
        F::known(1, "tcpControlBits", D::Unsigned16),
        F::known(1, "protocolIdentifier", D::Unsigned8),
        F::known(1, "ipClassOfService", D::Unsigned8),
        F::known(2, "bgpSourceAsNumber", D::Unsigned32),
        F::known(2, "bgpDestinationAsNumber", D::Unsigned32),
        F::known(1, "sourceIPv4PrefixLength", D::Unsigned8),
        F::known(1, "destinationIPv4PrefixLength", D::Unsigned8),
    ]);
    fields
}

/// 고정 템플릿 하나로 레코드를 읽는 v1/v5/v6/v7 디코더
#[derive(Debug)]
pub struct LegacyProtocol {
    name: &'static str,
    version: u16,
    header_context: &'static str,
    tail: HeaderTail,
    template: &'static Template,
}

impl LegacyProtocol {
    /// v1 디코더
    pub fn v1() -> Self {
        Self::new("v1", 1, "v1 header", HeaderTail::None, &V1_TEMPLATE)
    }

    /// v5 디코더
    pub fn v5() -> Self {
        Self::new("v5", 5, "v5 header", HeaderTail::Engine, &V5_TEMPLATE)
    }

    /// v6 디코더
    pub fn v6() -> Self {
        Self::new("v6", 6, "v6 header", HeaderTail::Engine, &V6_TEMPLATE)
    }

    /// v7 디코더
    pub fn v7() -> Self {
        Self::new("v7", 7, "v7 header", HeaderTail::Reserved, &V7_TEMPLATE)
    }

    fn new(
        name: &'static str,
        version: u16,
        header_context: &'static str,
        tail: HeaderTail,
        template: &'static Template,
    ) -> Self {
        Self {
            name,
            version,
            header_context,
            tail,
            template,
        }
    }

    /// 레코드 템플릿
    pub fn template(&self) -> &Template {
        self.template
    }
}

impl Protocol for LegacyProtocol {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> u16 {
        self.version
    }

    fn on_packet(&self, packet: Bytes, source: SocketAddr) -> Result<Vec<Record>, NetflowError> {
        let mut buf = packet;
        ensure_remaining(
            &buf,
            BASE_HEADER_LEN + self.tail.len(),
            self.header_context,
        )?;

        let version = buf.get_u16();
        let count = buf.get_u16();
        let uptime = buf.get_u32();
        let secs = buf.get_u32();
        let nanos = buf.get_u32();
        let timestamp = unix_time(secs, nanos);

        let mut exporter = exporter_metadata(version, timestamp, Some(uptime), source);
        match self.tail {
            HeaderTail::None => {}
            HeaderTail::Engine => {
                let _sequence = buf.get_u32();
                exporter.insert(
                    "engineType".to_owned(),
                    FieldValue::Unsigned(u64::from(buf.get_u8())),
                );
                exporter.insert(
                    "engineId".to_owned(),
                    FieldValue::Unsigned(u64::from(buf.get_u8())),
                );
                exporter.insert(
                    "samplingInterval".to_owned(),
                    FieldValue::Unsigned(u64::from(buf.get_u16())),
                );
            }
            HeaderTail::Reserved => {
                let _sequence = buf.get_u32();
                buf.advance(4);
            }
        }

        let mut records = self.template.apply(&mut buf, usize::from(count))?;
        stamp_records(&mut records, timestamp, &exporter);
        Ok(records)
    }
}

/// v1 팩토리
pub fn new_v1(_config: &DecoderConfig, _fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(LegacyProtocol::v1())
}

/// v5 팩토리
pub fn new_v5(_config: &DecoderConfig, _fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(LegacyProtocol::v5())
}

/// v6 팩토리
pub fn new_v6(_config: &DecoderConfig, _fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(LegacyProtocol::v6())
}

/// v7 팩토리
pub fn new_v7(_config: &DecoderConfig, _fields: &Arc<FieldDict>) -> Box<dyn Protocol> {
    Box::new(LegacyProtocol::v7())
}
