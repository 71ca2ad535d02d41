//! 필드 타입 디코더 -- 바이트 구간을 타입이 있는 값으로 변환
//!
//! 각 디코더는 허용 길이 범위([`Decoder::min_length`], [`Decoder::max_length`])와
//! [`Decoder::decode`]를 제공합니다. 정수는 빅엔디언이며 공칭 폭보다 짧은 입력
//! (reduced-size encoding)도 받아들입니다.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};

use crate::error::NetflowError;
use crate::record::{FieldValue, MacAddress};

/// NTP 기원(1900-01-01)과 UNIX 기원 사이의 초
const UNIX_EPOCH_IN_NTP: i64 = 2_208_988_800;

/// 가변 길이 타입이 가질 수 있는 최대 길이
const MAX_VARIABLE: u16 = u16::MAX;

/// 정보 요소(information element)의 값 디코더
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decoder {
    Unsigned8,
    Unsigned16,
    Unsigned32,
    Unsigned64,
    Signed8,
    Signed16,
    Signed32,
    Signed64,
    Float32,
    Float64,
    Boolean,
    MacAddress,
    OctetArray,
    String,
    DateTimeSeconds,
    DateTimeMilliseconds,
    /// NTP 64비트 형식 (초 + 2^-32 단위 소수부)
    DateTimeMicroseconds,
    /// NTP 64비트 형식 (초 + 2^-32 단위 소수부)
    DateTimeNanoseconds,
    Ipv4Address,
    Ipv6Address,
    /// RFC 6313 basicList (디코딩 미지원)
    BasicList,
    /// RFC 6313 subTemplateList (디코딩 미지원)
    SubTemplateList,
    /// RFC 6313 subTemplateMultiList (디코딩 미지원)
    SubTemplateMultiList,
    /// Cisco ASA ACL ID (12바이트, 대시로 구분된 16진수)
    AclId,
}

impl Decoder {
    /// 디코더의 타입 이름 (IANA abstract data type 표기)
    pub fn name(self) -> &'static str {
        match self {
            Self::Unsigned8 => "unsigned8",
            Self::Unsigned16 => "unsigned16",
            Self::Unsigned32 => "unsigned32",
            Self::Unsigned64 => "unsigned64",
            Self::Signed8 => "signed8",
            Self::Signed16 => "signed16",
            Self::Signed32 => "signed32",
            Self::Signed64 => "signed64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Boolean => "boolean",
            Self::MacAddress => "macAddress",
            Self::OctetArray => "octetArray",
            Self::String => "string",
            Self::DateTimeSeconds => "dateTimeSeconds",
            Self::DateTimeMilliseconds => "dateTimeMilliseconds",
            Self::DateTimeMicroseconds => "dateTimeMicroseconds",
            Self::DateTimeNanoseconds => "dateTimeNanoseconds",
            Self::Ipv4Address => "ipv4Address",
            Self::Ipv6Address => "ipv6Address",
            Self::BasicList => "basicList",
            Self::SubTemplateList => "subTemplateList",
            Self::SubTemplateMultiList => "subTemplateMultiList",
            Self::AclId => "aclId",
        }
    }

    /// 타입 이름으로 디코더를 찾습니다. 대소문자를 구분하지 않습니다.
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_DECODERS
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }

    /// 허용하는 최소 입력 길이
    pub fn min_length(self) -> u16 {
        match self {
            Self::Unsigned8
            | Self::Unsigned16
            | Self::Unsigned32
            | Self::Unsigned64
            | Self::Signed8
            | Self::Signed16
            | Self::Signed32
            | Self::Signed64
            | Self::Boolean => 1,
            Self::Float32 | Self::Float64 | Self::DateTimeSeconds | Self::Ipv4Address => 4,
            Self::MacAddress => 6,
            Self::DateTimeMilliseconds
            | Self::DateTimeMicroseconds
            | Self::DateTimeNanoseconds => 8,
            Self::AclId => 12,
            Self::Ipv6Address => 16,
            Self::OctetArray
            | Self::String
            | Self::BasicList
            | Self::SubTemplateList
            | Self::SubTemplateMultiList => 0,
        }
    }

    /// 허용하는 최대 입력 길이
    pub fn max_length(self) -> u16 {
        match self {
            Self::Unsigned8 | Self::Signed8 | Self::Boolean => 1,
            Self::Unsigned16 | Self::Signed16 => 2,
            Self::Unsigned32
            | Self::Signed32
            | Self::Float32
            | Self::DateTimeSeconds
            | Self::Ipv4Address => 4,
            Self::MacAddress => 6,
            Self::Unsigned64
            | Self::Signed64
            | Self::Float64
            | Self::DateTimeMilliseconds
            | Self::DateTimeMicroseconds
            | Self::DateTimeNanoseconds => 8,
            Self::AclId => 12,
            Self::Ipv6Address => 16,
            Self::OctetArray
            | Self::String
            | Self::BasicList
            | Self::SubTemplateList
            | Self::SubTemplateMultiList => MAX_VARIABLE,
        }
    }

    /// 디코딩을 지원하는 타입인지 확인합니다.
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            Self::BasicList | Self::SubTemplateList | Self::SubTemplateMultiList
        )
    }

    /// 바이트 구간을 값으로 디코딩합니다.
    pub fn decode(self, data: &[u8]) -> Result<FieldValue, NetflowError> {
        if !self.is_supported() {
            return Err(NetflowError::field(self.name(), "type is not supported"));
        }
        self.check_length(data)?;

        match self {
            Self::Unsigned8 | Self::Unsigned16 | Self::Unsigned32 | Self::Unsigned64 => {
                Ok(FieldValue::Unsigned(be_unsigned(data)))
            }
            Self::Signed8 | Self::Signed16 | Self::Signed32 | Self::Signed64 => {
                Ok(FieldValue::Signed(be_signed(data)))
            }
            Self::Float32 => Ok(FieldValue::Float(f64::from(f32::from_bits(
                be_unsigned(data) as u32,
            )))),
            Self::Float64 => match data.len() {
                4 => Ok(FieldValue::Float(f64::from(f32::from_bits(
                    be_unsigned(data) as u32,
                )))),
                8 => Ok(FieldValue::Float(f64::from_bits(be_unsigned(data)))),
                n => Err(NetflowError::field(
                    self.name(),
                    format!("expected 4 or 8 bytes, got {n}"),
                )),
            },
            Self::Boolean => match data[0] {
                1 => Ok(FieldValue::Bool(true)),
                2 => Ok(FieldValue::Bool(false)),
                other => Err(NetflowError::field(
                    self.name(),
                    format!("invalid truth value {other}"),
                )),
            },
            Self::MacAddress => {
                let mut mac = [0u8; 6];
                mac.copy_from_slice(data);
                Ok(FieldValue::Mac(MacAddress(mac)))
            }
            Self::OctetArray => Ok(FieldValue::Bytes(data.to_vec())),
            Self::String => Ok(decode_string(data)),
            Self::DateTimeSeconds => {
                let secs = be_unsigned(data) as i64;
                timestamp(self, DateTime::from_timestamp(secs, 0))
            }
            Self::DateTimeMilliseconds => {
                let millis = i64::try_from(be_unsigned(data))
                    .map_err(|_| NetflowError::field(self.name(), "timestamp out of range"))?;
                timestamp(self, DateTime::from_timestamp_millis(millis))
            }
            Self::DateTimeMicroseconds | Self::DateTimeNanoseconds => {
                let raw = be_unsigned(data);
                let secs = (raw >> 32) as i64 - UNIX_EPOCH_IN_NTP;
                let nanos = ((raw & 0xFFFF_FFFF) * 1_000_000_000) >> 32;
                timestamp(self, DateTime::from_timestamp(secs, nanos as u32))
            }
            Self::Ipv4Address => {
                let octets: [u8; 4] = [data[0], data[1], data[2], data[3]];
                Ok(FieldValue::from(Ipv4Addr::from(octets)))
            }
            Self::Ipv6Address => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(data);
                Ok(FieldValue::from(Ipv6Addr::from(octets)))
            }
            Self::AclId => Ok(FieldValue::String(format_acl_id(data))),
            Self::BasicList | Self::SubTemplateList | Self::SubTemplateMultiList => {
                Err(NetflowError::field(self.name(), "type is not supported"))
            }
        }
    }

    fn check_length(self, data: &[u8]) -> Result<(), NetflowError> {
        let len = data.len();
        if len < usize::from(self.min_length()) {
            return Err(NetflowError::field(
                self.name(),
                format!("{len} bytes is shorter than minimum {}", self.min_length()),
            ));
        }
        if len > usize::from(self.max_length()) {
            return Err(NetflowError::field(
                self.name(),
                format!("{len} bytes is longer than maximum {}", self.max_length()),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const ALL_DECODERS: [Decoder; 24] = [
    Decoder::Unsigned8,
    Decoder::Unsigned16,
    Decoder::Unsigned32,
    Decoder::Unsigned64,
    Decoder::Signed8,
    Decoder::Signed16,
    Decoder::Signed32,
    Decoder::Signed64,
    Decoder::Float32,
    Decoder::Float64,
    Decoder::Boolean,
    Decoder::MacAddress,
    Decoder::OctetArray,
    Decoder::String,
    Decoder::DateTimeSeconds,
    Decoder::DateTimeMilliseconds,
    Decoder::DateTimeMicroseconds,
    Decoder::DateTimeNanoseconds,
    Decoder::Ipv4Address,
    Decoder::Ipv6Address,
    Decoder::BasicList,
    Decoder::SubTemplateList,
    Decoder::SubTemplateMultiList,
    Decoder::AclId,
];

/// 최대 8바이트 빅엔디언 부호 없는 정수
fn be_unsigned(data: &[u8]) -> u64 {
    data.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// 최상위 입력 바이트에서 부호 확장한 빅엔디언 정수
fn be_signed(data: &[u8]) -> i64 {
    let shift = 64 - 8 * data.len() as u32;
    ((be_unsigned(data) << shift) as i64) >> shift
}

/// 끝의 NUL만 제거합니다. UTF-8이 아니면 원시 바이트를 그대로 보존합니다.
fn decode_string(data: &[u8]) -> FieldValue {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    let trimmed = &data[..end];
    match std::str::from_utf8(trimmed) {
        Ok(text) => FieldValue::String(text.to_owned()),
        Err(_) => FieldValue::Bytes(trimmed.to_vec()),
    }
}

fn format_acl_id(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2 + 2);
    for (idx, chunk) in data.chunks(4).enumerate() {
        if idx > 0 {
            out.push('-');
        }
        for byte in chunk {
            out.push_str(&format!("{byte:02x}"));
        }
    }
    out
}

fn timestamp(
    decoder: Decoder,
    value: Option<DateTime<Utc>>,
) -> Result<FieldValue, NetflowError> {
    value
        .map(FieldValue::Timestamp)
        .ok_or_else(|| NetflowError::field(decoder.name(), "timestamp out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn unsigned_accepts_reduced_size() {
        assert_eq!(
            Decoder::Unsigned64.decode(&[0x01, 0x02]).unwrap(),
            FieldValue::Unsigned(0x0102)
        );
        assert_eq!(
            Decoder::Unsigned32.decode(&[0xff, 0xff, 0xff, 0xff]).unwrap(),
            FieldValue::Unsigned(0xffff_ffff)
        );
    }

    #[test]
    fn integers_reject_empty_and_oversized_input() {
        assert!(Decoder::Unsigned8.decode(&[]).is_err());
        assert!(Decoder::Unsigned8.decode(&[1, 2]).is_err());
        assert!(Decoder::Unsigned16.decode(&[1, 2, 3]).is_err());
        assert!(Decoder::Signed32.decode(&[]).is_err());
        assert!(Decoder::Unsigned64.decode(&[0; 9]).is_err());
    }

    #[test]
    fn signed_sign_extends() {
        assert_eq!(
            Decoder::Signed16.decode(&[0x80, 0x00]).unwrap(),
            FieldValue::Signed(-32768)
        );
        assert_eq!(
            Decoder::Signed64.decode(&[0xff]).unwrap(),
            FieldValue::Signed(-1)
        );
        assert_eq!(
            Decoder::Signed32.decode(&[0x7f, 0xff]).unwrap(),
            FieldValue::Signed(0x7fff)
        );
        assert_eq!(
            Decoder::Signed64.decode(&[0x80, 0, 0, 0, 0, 0, 0, 0]).unwrap(),
            FieldValue::Signed(i64::MIN)
        );
    }

    #[test]
    fn float_lengths() {
        let one32 = 1.5f32.to_be_bytes();
        let one64 = 2.25f64.to_be_bytes();
        assert_eq!(
            Decoder::Float32.decode(&one32).unwrap(),
            FieldValue::Float(1.5)
        );
        assert_eq!(
            Decoder::Float64.decode(&one64).unwrap(),
            FieldValue::Float(2.25)
        );
        // float64 필드에 4바이트 float32가 오면 확장
        assert_eq!(
            Decoder::Float64.decode(&one32).unwrap(),
            FieldValue::Float(1.5)
        );
        assert!(Decoder::Float32.decode(&one64).is_err());
        assert!(Decoder::Float64.decode(&[0; 3]).is_err());
        assert!(Decoder::Float64.decode(&[0; 5]).is_err());
    }

    #[test]
    fn boolean_truth_value() {
        assert_eq!(Decoder::Boolean.decode(&[1]).unwrap(), FieldValue::Bool(true));
        assert_eq!(
            Decoder::Boolean.decode(&[2]).unwrap(),
            FieldValue::Bool(false)
        );
        assert!(Decoder::Boolean.decode(&[0]).is_err());
        assert!(Decoder::Boolean.decode(&[3]).is_err());
        assert!(Decoder::Boolean.decode(&[1, 1]).is_err());
    }

    #[test]
    fn mac_address_requires_six_bytes() {
        let value = Decoder::MacAddress.decode(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(value, FieldValue::Mac(MacAddress([1, 2, 3, 4, 5, 6])));
        assert!(Decoder::MacAddress.decode(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn string_strips_only_trailing_nul() {
        assert_eq!(
            Decoder::String.decode(b"eth0\0\0\0").unwrap(),
            FieldValue::String("eth0".to_owned())
        );
        assert_eq!(
            Decoder::String.decode(b"a\0b\0").unwrap(),
            FieldValue::String("a\0b".to_owned())
        );
        assert_eq!(
            Decoder::String.decode(b"").unwrap(),
            FieldValue::String(String::new())
        );
        assert_eq!(
            Decoder::String.decode(b"\0\0").unwrap(),
            FieldValue::String(String::new())
        );
    }

    #[test]
    fn string_keeps_invalid_utf8_bytes() {
        assert_eq!(
            Decoder::String.decode(&[0x61, 0xff, 0xfe, 0x00]).unwrap(),
            FieldValue::Bytes(vec![0x61, 0xff, 0xfe])
        );
    }

    #[test]
    fn octet_array_allows_empty() {
        assert_eq!(
            Decoder::OctetArray.decode(&[]).unwrap(),
            FieldValue::Bytes(Vec::new())
        );
        assert_eq!(
            Decoder::OctetArray.decode(&[9, 8]).unwrap(),
            FieldValue::Bytes(vec![9, 8])
        );
    }

    #[test]
    fn ip_addresses_require_exact_length() {
        assert_eq!(
            Decoder::Ipv4Address.decode(&[192, 168, 0, 1]).unwrap(),
            FieldValue::from(Ipv4Addr::new(192, 168, 0, 1))
        );
        assert!(Decoder::Ipv4Address.decode(&[192, 168, 0]).is_err());
        let v6 = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
        assert_eq!(
            Decoder::Ipv6Address.decode(&v6.octets()).unwrap(),
            FieldValue::from(v6)
        );
        assert!(Decoder::Ipv6Address.decode(&[0; 15]).is_err());
    }

    #[test]
    fn date_time_seconds() {
        let value = Decoder::DateTimeSeconds
            .decode(&0x5bf6_89f6u32.to_be_bytes())
            .unwrap();
        assert_eq!(value.as_timestamp(), Some(utc("2018-11-22T10:50:30Z")));
        assert!(Decoder::DateTimeSeconds.decode(&[0; 8]).is_err());
    }

    #[test]
    fn date_time_milliseconds() {
        let value = Decoder::DateTimeMilliseconds
            .decode(&1_542_884_374_123u64.to_be_bytes())
            .unwrap();
        assert_eq!(value.as_timestamp(), Some(utc("2018-11-22T10:59:34.123Z")));
        assert!(Decoder::DateTimeMilliseconds.decode(&[0; 4]).is_err());
        assert!(Decoder::DateTimeMilliseconds.decode(&[0xff; 8]).is_err());
    }

    #[test]
    fn date_time_ntp() {
        let raw = [0xdf, 0x96, 0xd0, 0x02, 0x56, 0x67, 0xf8, 0xf3];
        let expected = utc("2018-11-14T16:46:58.337523993Z");
        assert_eq!(
            Decoder::DateTimeNanoseconds.decode(&raw).unwrap().as_timestamp(),
            Some(expected)
        );
        assert_eq!(
            Decoder::DateTimeMicroseconds.decode(&raw).unwrap().as_timestamp(),
            Some(expected)
        );
        assert!(Decoder::DateTimeNanoseconds.decode(&raw[..4]).is_err());
    }

    #[test]
    fn unsupported_lists_always_fail() {
        assert!(Decoder::BasicList.decode(&[]).is_err());
        assert!(Decoder::SubTemplateList.decode(&[1, 2, 3]).is_err());
        assert!(Decoder::SubTemplateMultiList.decode(&[0; 16]).is_err());
        assert!(!Decoder::BasicList.is_supported());
    }

    #[test]
    fn acl_id_format() {
        let raw = [
            0x10, 0x21, 0x32, 0x43, 0x54, 0x65, 0x76, 0x87, 0x98, 0xa9, 0xba, 0xcd,
        ];
        assert_eq!(
            Decoder::AclId.decode(&raw).unwrap(),
            FieldValue::String("10213243-54657687-98a9bacd".to_owned())
        );
        assert!(Decoder::AclId.decode(&raw[..11]).is_err());
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Decoder::from_name("ipv4Address"), Some(Decoder::Ipv4Address));
        assert_eq!(Decoder::from_name("UNSIGNED32"), Some(Decoder::Unsigned32));
        assert_eq!(Decoder::from_name("int128"), None);
        for decoder in ALL_DECODERS {
            assert_eq!(Decoder::from_name(decoder.name()), Some(decoder));
        }
    }

    proptest! {
        #[test]
        fn unsigned_roundtrips_bit_pattern(value: u64, len in 1usize..=8) {
            let bytes = value.to_be_bytes();
            let slice = &bytes[8 - len..];
            let decoded = Decoder::Unsigned64.decode(slice).unwrap().as_u64().unwrap();
            prop_assert_eq!(&decoded.to_be_bytes()[8 - len..], slice);
        }

        #[test]
        fn signed_matches_native_sign_extension(value: i64, len in 1usize..=8) {
            let bytes = value.to_be_bytes();
            let slice = &bytes[8 - len..];
            let decoded = Decoder::Signed64.decode(slice).unwrap().as_i64().unwrap();
            let shift = 64 - 8 * len as u32;
            prop_assert_eq!(decoded, (value << shift) >> shift);
        }
    }
}
