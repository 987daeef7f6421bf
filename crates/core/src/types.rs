//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 심각도, facility, 필터 모드, 로그 소스, 그리고 파이프라인을 한 번 통과하는
//! [`LogEvent`]를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Syslog 심각도 (RFC 5424 Section 6.2.1)
///
/// 숫자가 작을수록 심각합니다. `Ord` 구현은 숫자 순서를 따르므로
/// `Emergency < Error < Debug` 입니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Severity {
    /// 0: 시스템 사용 불가
    Emergency = 0,
    /// 1: 즉시 조치 필요
    Alert = 1,
    /// 2: 치명적 상태
    Critical = 2,
    /// 3: 에러
    Error = 3,
    /// 4: 경고
    Warning = 4,
    /// 5: 정상이지만 주목할 만한 상태
    Notice = 5,
    /// 6: 정보성 메시지
    Informational = 6,
    /// 7: 디버그 메시지
    #[default]
    Debug = 7,
}

impl Severity {
    /// 모든 심각도 (0..=7 순서)
    pub const ALL: [Severity; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Informational,
        Self::Debug,
    ];

    /// 정수 레벨을 심각도로 변환합니다.
    ///
    /// 7을 넘는 값은 `Debug`로 고정됩니다.
    pub fn from_level(level: u8) -> Self {
        Self::ALL[usize::from(level.min(7))]
    }

    /// 레벨 이름에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다. syslog 표준 이름 외에 호스트 로거의
    /// 레벨 이름(`CONFIG`, `VERBOSE`, `VERY_VERBOSE`)도 받습니다.
    /// 호스트 로거의 `NONE`은 "아무것도 내보내지 않음"이라 임계값으로 표현할 수 없으므로 `None`입니다.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "EMERG" | "EMERGENCY" => Some(Self::Emergency),
            "ALERT" => Some(Self::Alert),
            "CRIT" | "CRITICAL" => Some(Self::Critical),
            "ERR" | "ERROR" => Some(Self::Error),
            "WARN" | "WARNING" => Some(Self::Warning),
            "NOTICE" | "CONFIG" => Some(Self::Notice),
            "INFO" | "INFORMATIONAL" => Some(Self::Informational),
            "DEBUG" | "VERBOSE" | "VERY_VERBOSE" => Some(Self::Debug),
            _ => None,
        }
    }

    /// 레벨 이름 또는 0-7 숫자 문자열을 파싱합니다.
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().parse::<u8>() {
            Ok(level) if level <= 7 => Some(Self::from_level(level)),
            Ok(_) => None,
            Err(_) => Self::from_name(value),
        }
    }

    /// 정수 레벨을 반환합니다.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// syslog 표준 이름을 반환합니다.
    pub fn name(self) -> &'static str {
        match self {
            Self::Emergency => "EMERG",
            Self::Alert => "ALERT",
            Self::Critical => "CRIT",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Informational => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Syslog facility (RFC 5424 Section 6.2.1)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Facility {
    Kern = 0,
    #[default]
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    Authpriv = 10,
    Ftp = 11,
    Ntp = 12,
    Security = 13,
    Console = 14,
    ClockDaemon = 15,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Facility {
    /// facility 이름을 파싱합니다 (대소문자 무시).
    pub fn from_name(name: &str) -> Option<Self> {
        let facility = match name.trim().to_ascii_lowercase().as_str() {
            "kern" => Self::Kern,
            "user" => Self::User,
            "mail" => Self::Mail,
            "daemon" => Self::Daemon,
            "auth" => Self::Auth,
            "syslog" => Self::Syslog,
            "lpr" => Self::Lpr,
            "news" => Self::News,
            "uucp" => Self::Uucp,
            "cron" => Self::Cron,
            "authpriv" => Self::Authpriv,
            "ftp" => Self::Ftp,
            "ntp" => Self::Ntp,
            "security" => Self::Security,
            "console" => Self::Console,
            "clock" => Self::ClockDaemon,
            "local0" => Self::Local0,
            "local1" => Self::Local1,
            "local2" => Self::Local2,
            "local3" => Self::Local3,
            "local4" => Self::Local4,
            "local5" => Self::Local5,
            "local6" => Self::Local6,
            "local7" => Self::Local7,
            _ => return None,
        };
        Some(facility)
    }

    /// facility 코드 (0-23)를 반환합니다.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// 심각도와 결합한 PRI 값을 계산합니다.
    ///
    /// PRI = facility * 8 + severity
    pub fn priority(self, severity: Severity) -> u8 {
        self.code() * 8 + severity.as_u8()
    }
}

/// 필터 모드
///
/// 규칙 집합을 허용 목록으로 쓸지 차단 목록으로 쓸지 결정합니다.
/// 규칙 내용과 독립적이며, 모드만 바꾸면 모든 태그의 통과 여부가 뒤집힙니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// 목록에 있는 태그만 통과
    Include,
    /// 목록에 있는 태그는 드롭, 나머지는 통과
    #[default]
    Exclude,
}

impl FilterMode {
    /// `include` / `exclude` 토큰을 파싱합니다 (대소문자 무시).
    ///
    /// `true` / `false`도 각각 include / exclude로 받습니다.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "include" | "true" => Some(Self::Include),
            "exclude" | "false" => Some(Self::Exclude),
            _ => None,
        }
    }

    /// include 여부 플래그에서 모드를 만듭니다.
    pub fn from_include_flag(include: bool) -> Self {
        if include { Self::Include } else { Self::Exclude }
    }

    /// 모드 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 이벤트가 유입된 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSource {
    /// 호스트 로깅 서브시스템 훅
    Logger,
    /// 자동화 액션 등에서 직접 호출
    Direct,
}

impl LogSource {
    /// 메트릭 레이블 등에 쓰이는 이름
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logger => "logger",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 로그 이벤트
///
/// 파이프라인을 한 번 통과하는 동안만 존재하는 값입니다.
/// 호출자의 문자열을 빌려 쓰므로 핫 패스에서 할당이 없습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEvent<'a> {
    /// 심각도
    pub severity: Severity,
    /// 태그 (필터 키)
    pub tag: &'a str,
    /// 메시지 본문
    pub message: &'a str,
}

impl<'a> LogEvent<'a> {
    /// 새 이벤트를 생성합니다.
    pub fn new(severity: Severity, tag: &'a str, message: &'a str) -> Self {
        Self {
            severity,
            tag,
            message,
        }
    }
}

impl fmt::Display for LogEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.tag, self.message)
    }
}
