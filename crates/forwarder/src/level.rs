//! 레벨 게이트 -- 심각도 임계값 검사

use std::sync::atomic::{AtomicU8, Ordering};

use sysfwd_core::types::Severity;

/// 심각도 임계값
///
/// 이벤트 레벨이 임계값 이하(더 심각하거나 같음)일 때만 통과합니다.
/// 임계값은 원자 변수이므로 평가 중에도 잠금 없이 바꿀 수 있습니다.
#[derive(Debug)]
pub struct LevelGate {
    threshold: AtomicU8,
}

impl LevelGate {
    /// 주어진 임계값으로 게이트를 생성합니다.
    pub fn new(threshold: Severity) -> Self {
        Self {
            threshold: AtomicU8::new(threshold.as_u8()),
        }
    }

    /// 정수 레벨이 임계값을 통과하는지 검사합니다.
    ///
    /// 7을 넘는 레벨은 7로 간주합니다.
    pub fn passes_level(&self, level: u8) -> bool {
        level.min(7) <= self.threshold.load(Ordering::Relaxed)
    }

    /// 심각도가 임계값을 통과하는지 검사합니다.
    pub fn passes(&self, severity: Severity) -> bool {
        self.passes_level(severity.as_u8())
    }

    /// 현재 임계값
    pub fn threshold(&self) -> Severity {
        Severity::from_level(self.threshold.load(Ordering::Relaxed))
    }

    /// 임계값을 바꾸고 이전 값을 반환합니다.
    pub fn set_threshold(&self, threshold: Severity) -> Severity {
        Severity::from_level(self.threshold.swap(threshold.as_u8(), Ordering::Relaxed))
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(Severity::Debug)
    }
}
