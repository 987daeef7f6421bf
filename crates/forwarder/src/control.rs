//! 런타임 제어 -- 활성화 플래그와 접두어
//!
//! 파이프라인 구조를 바꾸지 않고 동작만 켜고 끄는 값들입니다.
//! 플래그는 원자 변수이므로 핫 패스에서 잠금 없이 읽힙니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use sysfwd_core::types::LogSource;
use tracing::info;

use crate::config::ForwarderConfig;

/// 런타임 제어 상태
#[derive(Debug)]
pub struct RuntimeControl {
    globally_enabled: AtomicBool,
    enable_logger: AtomicBool,
    enable_direct_logs: AtomicBool,
    strip_colors: AtomicBool,
    logger_prefix: RwLock<Arc<str>>,
    direct_prefix: RwLock<Arc<str>>,
}

impl RuntimeControl {
    /// 설정값으로 초기화합니다.
    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self {
            globally_enabled: AtomicBool::new(config.globally_enabled),
            enable_logger: AtomicBool::new(config.enable_logger),
            enable_direct_logs: AtomicBool::new(config.enable_direct_logs),
            strip_colors: AtomicBool::new(config.strip_colors),
            logger_prefix: RwLock::new(Arc::from(config.logger_prefix.as_str())),
            direct_prefix: RwLock::new(Arc::from(config.direct_prefix.as_str())),
        }
    }

    pub fn globally_enabled(&self) -> bool {
        self.globally_enabled.load(Ordering::Relaxed)
    }

    pub fn logger_enabled(&self) -> bool {
        self.enable_logger.load(Ordering::Relaxed)
    }

    pub fn direct_logs_enabled(&self) -> bool {
        self.enable_direct_logs.load(Ordering::Relaxed)
    }

    pub fn strip_colors(&self) -> bool {
        self.strip_colors.load(Ordering::Relaxed)
    }

    /// 소스별 게이트가 열려 있는지 확인합니다.
    pub fn source_enabled(&self, source: LogSource) -> bool {
        match source {
            LogSource::Logger => self.logger_enabled(),
            LogSource::Direct => self.direct_logs_enabled(),
        }
    }

    /// 소스별 접두어
    pub fn prefix(&self, source: LogSource) -> Arc<str> {
        let slot = match source {
            LogSource::Logger => &self.logger_prefix,
            LogSource::Direct => &self.direct_prefix,
        };
        Arc::clone(&slot.read())
    }

    /// 전역 활성화 여부를 설정합니다. 바뀌었으면 `true`.
    pub fn set_globally_enabled(&self, enabled: bool) -> bool {
        toggle(&self.globally_enabled, "syslog forwarding", enabled)
    }

    /// 로거 훅 메시지 전달 여부를 설정합니다. 바뀌었으면 `true`.
    pub fn set_logger_enabled(&self, enabled: bool) -> bool {
        toggle(&self.enable_logger, "logger messages", enabled)
    }

    /// 직접 호출 로그 전달 여부를 설정합니다. 바뀌었으면 `true`.
    pub fn set_direct_logs_enabled(&self, enabled: bool) -> bool {
        toggle(&self.enable_direct_logs, "direct logging", enabled)
    }

    /// 색상 코드 제거 여부를 설정합니다. 바뀌었으면 `true`.
    pub fn set_strip_colors(&self, strip: bool) -> bool {
        toggle(&self.strip_colors, "strip colors", strip)
    }

    /// 소스별 접두어를 설정합니다.
    pub fn set_prefix(&self, source: LogSource, prefix: &str) {
        let slot = match source {
            LogSource::Logger => &self.logger_prefix,
            LogSource::Direct => &self.direct_prefix,
        };
        let mut current = slot.write();
        if &**current != prefix {
            info!(source = %source, prefix = prefix, "log prefix updated");
            *current = Arc::from(prefix);
        }
    }
}

fn toggle(flag: &AtomicBool, setting: &str, value: bool) -> bool {
    let old = flag.swap(value, Ordering::Relaxed);
    if old == value {
        return false;
    }
    info!(
        setting,
        "{}: {} -> {}",
        setting,
        state_name(old),
        state_name(value)
    );
    true
}

fn state_name(enabled: bool) -> &'static str {
    if enabled { "enabled" } else { "disabled" }
}
