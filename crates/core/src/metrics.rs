//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 포워더는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않았으면 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sysfwd_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sysfwd_core::metrics::PACKETS_SENT_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 소스 레이블 키 (logger, direct)
pub const LABEL_SOURCE: &str = "source";

/// 드롭 사유 레이블 키 (disabled, source, level, filter)
pub const LABEL_REASON: &str = "reason";

// ─── 드롭 사유 레이블 값 ────────────────────────────────────────────

/// 전역 비활성화로 드롭
pub const REASON_DISABLED: &str = "disabled";

/// 소스별 게이트(로거 훅/직접 호출) 비활성화로 드롭
pub const REASON_SOURCE: &str = "source";

/// 레벨 게이트에서 드롭
pub const REASON_LEVEL: &str = "level";

/// 태그 필터에서 드롭
pub const REASON_FILTER: &str = "filter";

// ─── 포워더 메트릭 ──────────────────────────────────────────────────

/// 유입된 전체 로그 이벤트 수 (counter, label: source)
pub const EVENTS_RECEIVED_TOTAL: &str = "sysfwd_events_received_total";

/// 드롭된 로그 이벤트 수 (counter, labels: source, reason)
pub const EVENTS_DROPPED_TOTAL: &str = "sysfwd_events_dropped_total";

/// 전송된 syslog 패킷 수 (counter)
pub const PACKETS_SENT_TOTAL: &str = "sysfwd_packets_sent_total";

/// 전송 실패 수 (counter)
pub const SEND_FAILURES_TOTAL: &str = "sysfwd_send_failures_total";

/// 잘려서 전송된 패킷 수 (counter)
pub const PACKETS_TRUNCATED_TOTAL: &str = "sysfwd_packets_truncated_total";

/// 필터 문자열 재적용 횟수 (counter)
pub const FILTER_RELOADS_TOTAL: &str = "sysfwd_filter_reloads_total";

/// 현재 필터 규칙 수 (gauge)
pub const FILTER_RULES: &str = "sysfwd_filter_rules";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        EVENTS_RECEIVED_TOTAL,
        "Total number of log events offered to the forwarder"
    );
    describe_counter!(
        EVENTS_DROPPED_TOTAL,
        "Total number of log events dropped before transmission, by reason"
    );
    describe_counter!(
        PACKETS_SENT_TOTAL,
        "Total number of syslog datagrams handed to the network"
    );
    describe_counter!(
        SEND_FAILURES_TOTAL,
        "Total number of datagram sends that failed and were discarded"
    );
    describe_counter!(
        PACKETS_TRUNCATED_TOTAL,
        "Total number of packets truncated to the maximum packet size"
    );
    describe_counter!(
        FILTER_RELOADS_TOTAL,
        "Total number of filter set replacements from a filter string"
    );
    describe_gauge!(FILTER_RULES, "Number of tags in the active filter set");
}
