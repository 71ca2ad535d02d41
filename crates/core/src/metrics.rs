//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더(exporter) 설치는 라이브러리 사용자의 몫입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `flowpost_`
//! - 모듈명: `netflow_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use flowpost_core::metrics as m;
//!
//! metrics::counter!(m::NETFLOW_PACKETS_RECEIVED_TOTAL, m::LABEL_VERSION => "v9").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 프로토콜 버전 레이블 키 (v1, v5, v6, v7, v8, v9, ipfix)
pub const LABEL_VERSION: &str = "version";

// ─── NetFlow 디코더 메트릭 ─────────────────────────────────────────

/// NetFlow: 수신한 패킷 수 (counter, label: version)
pub const NETFLOW_PACKETS_RECEIVED_TOTAL: &str = "flowpost_netflow_packets_received_total";

/// NetFlow: 디코딩된 레코드 수 (counter, label: version)
pub const NETFLOW_RECORDS_DECODED_TOTAL: &str = "flowpost_netflow_records_decoded_total";

/// NetFlow: 패킷 디코딩 실패 수 (counter, label: version)
pub const NETFLOW_DECODE_ERRORS_TOTAL: &str = "flowpost_netflow_decode_errors_total";

/// NetFlow: 지원하지 않는 버전의 패킷 수 (counter)
pub const NETFLOW_UNSUPPORTED_VERSION_TOTAL: &str = "flowpost_netflow_unsupported_version_total";

/// NetFlow: 등록된 템플릿 수 (counter)
pub const NETFLOW_TEMPLATES_REGISTERED_TOTAL: &str = "flowpost_netflow_templates_registered_total";

/// NetFlow: 거부된 템플릿 셋 수 (counter)
pub const NETFLOW_INVALID_TEMPLATE_SETS_TOTAL: &str =
    "flowpost_netflow_invalid_template_sets_total";

/// NetFlow: 템플릿을 찾지 못한 데이터 셋 수 (counter)
pub const NETFLOW_UNKNOWN_TEMPLATE_SETS_TOTAL: &str =
    "flowpost_netflow_unknown_template_sets_total";

/// NetFlow: 감지된 시퀀스 리셋 수 (counter)
pub const NETFLOW_SEQUENCE_RESETS_TOTAL: &str = "flowpost_netflow_sequence_resets_total";

/// NetFlow: 활성 세션 수 (gauge)
pub const NETFLOW_ACTIVE_SESSIONS: &str = "flowpost_netflow_active_sessions";

/// NetFlow: 만료된 세션 수 (counter)
pub const NETFLOW_SESSIONS_EXPIRED_TOTAL: &str = "flowpost_netflow_sessions_expired_total";

/// NetFlow: 만료된 템플릿 수 (counter)
pub const NETFLOW_TEMPLATES_EXPIRED_TOTAL: &str = "flowpost_netflow_templates_expired_total";

/// NetFlow: 대기 캐시에 보관 중인 버퍼 수 (gauge)
pub const NETFLOW_PENDING_BUFFERS: &str = "flowpost_netflow_pending_buffers";

/// NetFlow: 대기 캐시에서 만료된 버퍼 수 (counter)
pub const NETFLOW_PENDING_EXPIRED_TOTAL: &str = "flowpost_netflow_pending_expired_total";

/// NetFlow: 템플릿 도착 후 재처리된 버퍼 수 (counter)
pub const NETFLOW_PENDING_REPLAYED_TOTAL: &str = "flowpost_netflow_pending_replayed_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        NETFLOW_PACKETS_RECEIVED_TOTAL,
        "Total number of NetFlow/IPFIX packets handed to the decoder"
    );
    describe_counter!(
        NETFLOW_RECORDS_DECODED_TOTAL,
        "Total number of flow and options records decoded"
    );
    describe_counter!(
        NETFLOW_DECODE_ERRORS_TOTAL,
        "Total number of packets that failed to decode"
    );
    describe_counter!(
        NETFLOW_UNSUPPORTED_VERSION_TOTAL,
        "Total number of packets with an unsupported or disabled version"
    );
    describe_counter!(
        NETFLOW_TEMPLATES_REGISTERED_TOTAL,
        "Total number of v9/IPFIX templates registered"
    );
    describe_counter!(
        NETFLOW_INVALID_TEMPLATE_SETS_TOTAL,
        "Total number of template sets rejected as invalid"
    );
    describe_counter!(
        NETFLOW_UNKNOWN_TEMPLATE_SETS_TOTAL,
        "Total number of data sets that referenced an unknown template"
    );
    describe_counter!(
        NETFLOW_SEQUENCE_RESETS_TOTAL,
        "Total number of exporter sequence number resets detected"
    );
    describe_gauge!(
        NETFLOW_ACTIVE_SESSIONS,
        "Number of exporter sessions currently tracked"
    );
    describe_counter!(
        NETFLOW_SESSIONS_EXPIRED_TOTAL,
        "Total number of exporter sessions removed by expiration"
    );
    describe_counter!(
        NETFLOW_TEMPLATES_EXPIRED_TOTAL,
        "Total number of templates removed by expiration"
    );
    describe_gauge!(
        NETFLOW_PENDING_BUFFERS,
        "Number of data sets waiting for their template"
    );
    describe_counter!(
        NETFLOW_PENDING_EXPIRED_TOTAL,
        "Total number of waiting data sets discarded by age"
    );
    describe_counter!(
        NETFLOW_PENDING_REPLAYED_TOTAL,
        "Total number of waiting data sets decoded after their template arrived"
    );
}
