//! 디코딩 결과 -- 레코드와 필드 값
//!
//! [`Record`]는 템플릿 하나를 적용해 얻은 플로우/옵션 레코드입니다.
//! 호출자가 소유하며 생성 이후 공유되는 가변 상태가 없습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// 필드 이름 → 값 맵
pub type FieldMap = BTreeMap<String, FieldValue>;

/// 옵션 레코드의 scope 하위 맵 키
pub const SCOPE_KEY: &str = "scope";

/// 옵션 레코드의 options 하위 맵 키
pub const OPTIONS_KEY: &str = "options";

/// 레코드 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// 트래픽 플로우
    Flow,
    /// exporter/인터페이스에 대한 메타데이터
    Options,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flow => f.write_str("flow"),
            Self::Options => f.write_str("options"),
        }
    }
}

/// 6바이트 MAC 주소
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 디코딩된 필드 값
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 부호 없는 정수
    Unsigned(u64),
    /// 부호 있는 정수
    Signed(i64),
    /// 부동소수점
    Float(f64),
    /// TruthValue
    Bool(bool),
    /// IPv4/IPv6 주소
    Ip(IpAddr),
    /// MAC 주소
    Mac(MacAddress),
    /// 문자열
    String(String),
    /// 원시 바이트 (octetArray, UTF-8이 아닌 문자열)
    Bytes(Vec<u8>),
    /// 시각
    Timestamp(DateTime<Utc>),
    /// 중첩 맵 (옵션 레코드의 scope/options)
    Map(FieldMap),
}

impl FieldValue {
    /// 부호 없는 정수 값을 반환합니다.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Unsigned(v) => Some(*v),
            _ => None,
        }
    }

    /// 부호 있는 정수 값을 반환합니다.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Signed(v) => Some(*v),
            _ => None,
        }
    }

    /// IP 주소 값을 반환합니다.
    pub fn as_ip(&self) -> Option<IpAddr> {
        match self {
            Self::Ip(ip) => Some(*ip),
            _ => None,
        }
    }

    /// 문자열 값을 반환합니다.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// 시각 값을 반환합니다.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// 중첩 맵을 반환합니다.
    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::Unsigned(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Signed(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<IpAddr> for FieldValue {
    fn from(v: IpAddr) -> Self {
        Self::Ip(v)
    }
}

impl From<Ipv4Addr> for FieldValue {
    fn from(v: Ipv4Addr) -> Self {
        Self::Ip(IpAddr::V4(v))
    }
}

impl From<Ipv6Addr> for FieldValue {
    fn from(v: Ipv6Addr) -> Self {
        Self::Ip(IpAddr::V6(v))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(v: FieldMap) -> Self {
        Self::Map(v)
    }
}

/// 디코딩된 플로우/옵션 레코드
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// 레코드 종류
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// 패킷 헤더의 export 시각
    pub timestamp: DateTime<Utc>,
    /// 필드 이름 → 값. 옵션 레코드는 `scope`, `options` 하위 맵을 가짐
    pub fields: FieldMap,
    /// exporter/패킷 메타데이터
    pub exporter: FieldMap,
}

impl Record {
    /// 필드 맵으로 레코드를 생성합니다. 시각과 exporter 정보는 프로토콜이 채웁니다.
    pub fn new(record_type: RecordType, fields: FieldMap) -> Self {
        Self {
            record_type,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            fields,
            exporter: FieldMap::new(),
        }
    }

    /// 최상위 필드를 조회합니다.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// 옵션 레코드의 scope 맵을 반환합니다.
    pub fn scope(&self) -> Option<&FieldMap> {
        self.fields.get(SCOPE_KEY).and_then(FieldValue::as_map)
    }

    /// 옵션 레코드의 options 맵을 반환합니다.
    pub fn options(&self) -> Option<&FieldMap> {
        self.fields.get(OPTIONS_KEY).and_then(FieldValue::as_map)
    }

    /// JSON 문자열로 직렬화합니다.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_display() {
        let mac = MacAddress([0x01, 0x02, 0x03, 0xaa, 0xbb, 0xcc]);
        assert_eq!(mac.to_string(), "01:02:03:aa:bb:cc");
    }

    #[test]
    fn record_serializes_nested_options() {
        let mut scope = FieldMap::new();
        scope.insert("ingressInterface".to_owned(), FieldValue::Unsigned(3));
        let mut fields = FieldMap::new();
        fields.insert(SCOPE_KEY.to_owned(), scope.into());
        fields.insert(OPTIONS_KEY.to_owned(), FieldMap::new().into());

        let record = Record::new(RecordType::Options, fields);
        assert_eq!(
            record.scope().and_then(|s| s.get("ingressInterface")),
            Some(&FieldValue::Unsigned(3))
        );
        assert!(record.options().is_some_and(FieldMap::is_empty));

        let json = record.to_json().unwrap();
        assert!(json.contains(r#""type":"options""#));
        assert!(json.contains(r#""scope":{"ingressInterface":3}"#));
    }

    #[test]
    fn field_value_accessors() {
        let ip: FieldValue = Ipv4Addr::new(10, 0, 0, 1).into();
        assert_eq!(ip.as_ip(), Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert_eq!(ip.as_u64(), None);
        assert_eq!(FieldValue::from("eth0").as_str(), Some("eth0"));
        assert_eq!(FieldValue::from(-5i64).as_i64(), Some(-5));
    }

    #[test]
    fn mac_serializes_as_string() {
        let value = FieldValue::Mac(MacAddress([0, 0x1b, 0x21, 0, 0, 1]));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#""00:1b:21:00:00:01""#
        );
    }
}
