//! 벤더 정보 요소 표

use super::types::Decoder;

/// RFC 5103 양방향 플로우의 역방향 요소 enterprise 번호
pub const REVERSE_PEN: u32 = 29305;

/// Cisco ASA NSEL 요소 (v9 번호 체계, enterprise 0)
///
/// (필드 ID, 이름, 디코더)
pub(super) const CISCO_NSEL_FIELDS: &[(u16, &str, Decoder)] = &[
    (33000, "ingressAclId", Decoder::AclId),
    (33001, "egressAclId", Decoder::AclId),
    (33002, "fwExtEvent", Decoder::Unsigned16),
    (40000, "username", Decoder::String),
    (40001, "xlateSourceAddressIPv4", Decoder::Ipv4Address),
    (40002, "xlateDestinationAddressIPv4", Decoder::Ipv4Address),
    (40003, "xlateSourcePort", Decoder::Unsigned16),
    (40004, "xlateDestinationPort", Decoder::Unsigned16),
    (40005, "fwEvent", Decoder::Unsigned8),
];

/// v9 옵션 템플릿의 scope 필드 유형
pub(super) const V9_SCOPE_FIELDS: &[(u16, &str, Decoder)] = &[
    (1, "scopeSystem", Decoder::OctetArray),
    (2, "scopeInterface", Decoder::Unsigned64),
    (3, "scopeLineCard", Decoder::Unsigned64),
    (4, "scopeNetFlowCache", Decoder::OctetArray),
    (5, "scopeTemplate", Decoder::Unsigned64),
];

/// 역방향 요소 이름: `octetDeltaCount` → `reverseOctetDeltaCount`
pub(super) fn reverse_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("reverse{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "reverse".to_owned(),
    }
}
