#![no_main]

use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;

use sysfwd_core::types::{Facility, LogEvent, Severity};
use sysfwd_forwarder::PacketFormatter;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    level: u8,
    client_id: String,
    tag: String,
    prefix: String,
    message: String,
    strip_colors: bool,
    include_timestamp: bool,
    /// 64 바이트 이상으로 보정
    max_packet_size: u16,
}

fuzz_target!(|input: FuzzInput| {
    let max = usize::from(input.max_packet_size).max(64);
    let Ok(formatter) =
        PacketFormatter::new(Facility::Local0, &input.client_id, input.include_timestamp, max)
    else {
        return;
    };

    let event = LogEvent::new(Severity::from_level(input.level), &input.tag, &input.message);
    let now = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_else(Utc::now);
    let packet = formatter.format_at(&event, &input.prefix, input.strip_colors, now);

    // 크기 제한과 UTF-8 유효성은 어떤 입력에서도 유지되어야 한다
    assert!(packet.bytes.len() <= max);
    assert!(std::str::from_utf8(&packet.bytes).is_ok());
    assert!(packet.bytes.starts_with(b"<"));
});
