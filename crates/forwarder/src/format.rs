//! 패킷 포맷터 -- RFC 5424 syslog 메시지 생성
//!
//! # 패킷 레이아웃
//!
//! ```text
//! <PRI>1 TIMESTAMP HOSTNAME APP-NAME - - - BOM MSG
//!   |        |        |        |             |    |
//!   |        |        |        |             |    +- 접두어 + 페이로드
//!   |        |        |        |             +- UTF-8 BOM (EF BB BF)
//!   |        |        |        +- 태그 (출력 가능한 ASCII, 최대 48자)
//!   |        |        +- 클라이언트 ID
//!   |        +- RFC 3339 UTC 밀리초, 또는 "-"
//!   +- facility * 8 + severity
//! ```
//!
//! PROCID, MSGID, STRUCTURED-DATA는 항상 NILVALUE(`-`)입니다.
//! 포맷팅은 실패하지 않습니다. 최대 크기를 넘으면 MSG만 UTF-8 문자 경계에서 잘리고,
//! 헤더와 BOM은 항상 온전히 남습니다. 헤더만으로 한도를 넘는 작은 패킷 크기에서는
//! APP-NAME, HOSTNAME 순서로 줄입니다 (각 필드 최소 한 글자).

use std::borrow::Cow;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use sysfwd_core::types::{Facility, LogEvent};

use crate::config::ForwarderConfig;
use crate::error::ForwarderError;

/// SGR(색상) 이스케이프 시퀀스: `ESC [ 파라미터 m`
const ANSI_SGR_PATTERN: &str = r"\x1b\[[0-9;]*m";

/// UTF-8 BOM
const BOM: &str = "\u{FEFF}";

/// RFC 5424 NILVALUE
const NIL: &str = "-";

/// APP-NAME 뒤의 ` PROCID MSGID STRUCTURED-DATA ` 부분
const NIL_FIELDS: &str = " - - - ";

/// APP-NAME 최대 길이 (RFC 5424 Section 6)
pub const MAX_APP_NAME_LEN: usize = 48;

/// HOSTNAME 최대 길이 (RFC 5424 Section 6)
pub const MAX_HOSTNAME_LEN: usize = 255;

/// 포맷 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedPacket {
    /// 전송할 바이트
    pub bytes: Bytes,
    /// 최대 크기 초과로 잘렸는지 여부
    pub truncated: bool,
}

/// RFC 5424 패킷 포맷터
#[derive(Debug, Clone)]
pub struct PacketFormatter {
    facility: Facility,
    hostname: String,
    include_timestamp: bool,
    max_packet_size: usize,
    ansi: Regex,
}

impl PacketFormatter {
    /// 새 포맷터를 생성합니다.
    ///
    /// `client_id`는 HOSTNAME 필드에 맞게 정리됩니다.
    pub fn new(
        facility: Facility,
        client_id: &str,
        include_timestamp: bool,
        max_packet_size: usize,
    ) -> Result<Self, ForwarderError> {
        Ok(Self {
            facility,
            hostname: header_token(client_id, MAX_HOSTNAME_LEN).into_owned(),
            include_timestamp,
            max_packet_size,
            ansi: Regex::new(ANSI_SGR_PATTERN)?,
        })
    }

    /// 포워더 설정에서 포맷터를 생성합니다.
    pub fn from_config(config: &ForwarderConfig) -> Result<Self, ForwarderError> {
        Self::new(
            config.facility,
            &config.client_id,
            config.include_timestamp,
            config.max_packet_size,
        )
    }

    /// 클라이언트 ID만 바꾼 포맷터를 반환합니다.
    pub fn with_client_id(&self, client_id: &str) -> Self {
        Self {
            hostname: header_token(client_id, MAX_HOSTNAME_LEN).into_owned(),
            ..self.clone()
        }
    }

    /// HOSTNAME 필드에 쓰이는 클라이언트 ID
    pub fn client_id(&self) -> &str {
        &self.hostname
    }

    /// 최대 패킷 크기
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// 현재 시각으로 이벤트를 포맷합니다.
    pub fn format(&self, event: &LogEvent<'_>, prefix: &str, strip_colors: bool) -> FormattedPacket {
        self.format_at(event, prefix, strip_colors, Utc::now())
    }

    /// 주어진 시각으로 이벤트를 포맷합니다.
    pub fn format_at(
        &self,
        event: &LogEvent<'_>,
        prefix: &str,
        strip_colors: bool,
        now: DateTime<Utc>,
    ) -> FormattedPacket {
        let message = if strip_colors {
            self.strip_ansi(event.message)
        } else {
            Cow::Borrowed(event.message)
        };

        let timestamp = if self.include_timestamp {
            Cow::Owned(now.to_rfc3339_opts(SecondsFormat::Millis, true))
        } else {
            Cow::Borrowed(NIL)
        };

        let tag = header_token(event.tag, MAX_APP_NAME_LEN);
        let mut packet = format!("<{}>1 {} ", self.facility.priority(event.severity), timestamp);

        // HOSTNAME 뒤 공백 + NIL_FIELDS + BOM
        let fixed = packet.len() + 1 + NIL_FIELDS.len() + BOM.len();
        let (hostname, app_name) = fit_header_fields(
            &self.hostname,
            &tag,
            self.max_packet_size.saturating_sub(fixed),
        );
        let header_shortened = hostname.len() < self.hostname.len() || app_name.len() < tag.len();

        packet.push_str(hostname);
        packet.push(' ');
        packet.push_str(app_name);
        packet.push_str(NIL_FIELDS);
        packet.push_str(BOM);

        let mut body = String::with_capacity(prefix.len() + message.len());
        body.push_str(prefix);
        body.push_str(&message);
        let body_truncated =
            truncate_on_char_boundary(&mut body, self.max_packet_size.saturating_sub(packet.len()));
        packet.push_str(&body);

        FormattedPacket {
            bytes: Bytes::from(packet.into_bytes()),
            truncated: header_shortened || body_truncated,
        }
    }

    /// SGR 색상 시퀀스를 제거합니다. 다른 제어 시퀀스는 그대로 둡니다.
    pub fn strip_ansi<'a>(&self, text: &'a str) -> Cow<'a, str> {
        self.ansi.replace_all(text, "")
    }
}

/// 헤더 필드용 토큰을 만듭니다.
///
/// 출력 가능한 ASCII(33-126)만 남기고 최대 길이로 자릅니다. 결과가 비면 `-`.
fn header_token(value: &str, max_len: usize) -> Cow<'_, str> {
    let printable = |c: char| c.is_ascii_graphic();
    if !value.is_empty() && value.len() <= max_len && value.chars().all(printable) {
        return Cow::Borrowed(value);
    }
    let token: String = value.chars().filter(|c| printable(*c)).take(max_len).collect();
    if token.is_empty() {
        Cow::Borrowed(NIL)
    } else {
        Cow::Owned(token)
    }
}

/// HOSTNAME과 APP-NAME이 합쳐서 `budget` 바이트 안에 들어가도록 줄입니다.
///
/// 두 값 모두 [`header_token`]을 거친 ASCII이므로 바이트 단위로 잘라도 안전합니다.
fn fit_header_fields<'a>(
    hostname: &'a str,
    app_name: &'a str,
    budget: usize,
) -> (&'a str, &'a str) {
    if hostname.len() + app_name.len() <= budget {
        return (hostname, app_name);
    }
    let app_len = budget.saturating_sub(hostname.len()).clamp(1, app_name.len());
    let host_len = budget.saturating_sub(app_len).clamp(1, hostname.len());
    (&hostname[..host_len], &app_name[..app_len])
}

/// `max_len` 바이트 이하가 되도록 문자 경계에서 자릅니다. 잘랐으면 `true`.
fn truncate_on_char_boundary(packet: &mut String, max_len: usize) -> bool {
    if packet.len() <= max_len {
        return false;
    }
    let mut end = max_len;
    while !packet.is_char_boundary(end) {
        end -= 1;
    }
    packet.truncate(end);
    true
}
