//! 로거 훅 -- `tracing` 이벤트를 포워더로 전달하는 레이어
//!
//! [`ForwarderLayer`]를 구독자에 추가하면 모든 `tracing` 이벤트가
//! [`SyslogForwarder::on_logger_event`]로 들어갑니다.
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(ForwarderLayer::new(forwarder.clone()))
//!     .init();
//! ```
//!
//! 포워더 자신의 진단 로그는 다시 포워더로 들어가지 않습니다.
//! 포워더 크레이트 타깃의 이벤트는 건너뛰고, 같은 스레드에서 처리 중인 이벤트가
//! 다른 이벤트를 낳으면 그 이벤트도 건너뜁니다.

use std::cell::Cell;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use sysfwd_core::types::Severity;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::dispatch::SyslogForwarder;

/// 포워더 크레이트의 `tracing` 타깃 접두어
const SELF_TARGET: &str = "sysfwd_forwarder";

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// `tracing` 레벨을 syslog 심각도로 변환합니다.
pub fn severity_for(level: &Level) -> Severity {
    match *level {
        Level::ERROR => Severity::Error,
        Level::WARN => Severity::Warning,
        Level::INFO => Severity::Informational,
        Level::DEBUG | Level::TRACE => Severity::Debug,
    }
}

/// 포워더 레이어
#[derive(Debug, Clone)]
pub struct ForwarderLayer {
    forwarder: Arc<SyslogForwarder>,
}

impl ForwarderLayer {
    /// 포워더에 연결된 레이어를 생성합니다.
    pub fn new(forwarder: Arc<SyslogForwarder>) -> Self {
        Self { forwarder }
    }
}

impl<S> Layer<S> for ForwarderLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target().starts_with(SELF_TARGET) {
            return;
        }
        if FORWARDING.with(|active| active.replace(true)) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.forwarder.on_logger_event(
            severity_for(metadata.level()).as_u8(),
            metadata.target(),
            &visitor.finish(),
        );

        FORWARDING.with(|active| active.set(false));
    }
}

/// `message` 필드와 나머지 필드를 한 줄로 모읍니다.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}
