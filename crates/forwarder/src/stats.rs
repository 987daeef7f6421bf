//! 포워더 통계
//!
//! 프로세스 내 원자 카운터와 Prometheus 메트릭을 함께 갱신합니다.
//! 메트릭 레코더가 없어도 [`StatsSnapshot`]으로 동작을 관찰할 수 있습니다.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use sysfwd_core::metrics as m;
use sysfwd_core::types::LogSource;

/// 이벤트가 드롭된 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// 전역 비활성화
    Disabled,
    /// 소스별 게이트 비활성화
    SourceDisabled,
    /// 레벨 게이트
    Level,
    /// 태그 필터
    Filter,
}

impl DropReason {
    /// 메트릭 레이블 값
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => m::REASON_DISABLED,
            Self::SourceDisabled => m::REASON_SOURCE,
            Self::Level => m::REASON_LEVEL,
            Self::Filter => m::REASON_FILTER,
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 누적 카운터
#[derive(Debug, Default)]
pub struct ForwarderStats {
    received_logger: AtomicU64,
    received_direct: AtomicU64,
    dropped_disabled: AtomicU64,
    dropped_source: AtomicU64,
    dropped_level: AtomicU64,
    dropped_filter: AtomicU64,
    sent: AtomicU64,
    send_failures: AtomicU64,
    truncated: AtomicU64,
    filter_reloads: AtomicU64,
}

impl ForwarderStats {
    /// 새 카운터 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self, source: LogSource) {
        let counter = match source {
            LogSource::Logger => &self.received_logger,
            LogSource::Direct => &self.received_direct,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::EVENTS_RECEIVED_TOTAL, m::LABEL_SOURCE => source.as_str())
            .increment(1);
    }

    pub(crate) fn record_dropped(&self, source: LogSource, reason: DropReason) {
        let counter = match reason {
            DropReason::Disabled => &self.dropped_disabled,
            DropReason::SourceDisabled => &self.dropped_source,
            DropReason::Level => &self.dropped_level,
            DropReason::Filter => &self.dropped_filter,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(
            m::EVENTS_DROPPED_TOTAL,
            m::LABEL_SOURCE => source.as_str(),
            m::LABEL_REASON => reason.as_str()
        )
        .increment(1);
    }

    pub(crate) fn record_sent(&self, truncated: bool) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::PACKETS_SENT_TOTAL).increment(1);
        if truncated {
            self.record_truncated();
        }
    }

    pub(crate) fn record_send_failure(&self, truncated: bool) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::SEND_FAILURES_TOTAL).increment(1);
        if truncated {
            self.record_truncated();
        }
    }

    pub(crate) fn record_filter_reload(&self) {
        self.filter_reloads.fetch_add(1, Ordering::Relaxed);
    }

    fn record_truncated(&self) {
        self.truncated.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(m::PACKETS_TRUNCATED_TOTAL).increment(1);
    }

    /// 현재 값의 스냅샷
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received_logger: self.received_logger.load(Ordering::Relaxed),
            received_direct: self.received_direct.load(Ordering::Relaxed),
            dropped_disabled: self.dropped_disabled.load(Ordering::Relaxed),
            dropped_source: self.dropped_source.load(Ordering::Relaxed),
            dropped_level: self.dropped_level.load(Ordering::Relaxed),
            dropped_filter: self.dropped_filter.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            filter_reloads: self.filter_reloads.load(Ordering::Relaxed),
        }
    }
}

/// 통계 스냅샷
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub received_logger: u64,
    pub received_direct: u64,
    pub dropped_disabled: u64,
    pub dropped_source: u64,
    pub dropped_level: u64,
    pub dropped_filter: u64,
    pub sent: u64,
    pub send_failures: u64,
    pub truncated: u64,
    pub filter_reloads: u64,
}

impl StatsSnapshot {
    /// 유입된 전체 이벤트 수
    pub fn received(&self) -> u64 {
        self.received_logger + self.received_direct
    }

    /// 드롭된 전체 이벤트 수
    pub fn dropped(&self) -> u64 {
        self.dropped_disabled + self.dropped_source + self.dropped_level + self.dropped_filter
    }
}
