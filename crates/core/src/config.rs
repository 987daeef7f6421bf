//! 설정 관리 -- sysfwd.toml 파싱 및 런타임 설정
//!
//! [`SysfwdConfig`]는 모든 섹션의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`SYSFWD_SYSLOG_PORT=5514` 형식)
//! 2. 설정 파일 (`sysfwd.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sysfwd_core::error::SysfwdError> {
//! use sysfwd_core::config::SysfwdConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SysfwdConfig::load("sysfwd.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SysfwdConfig::parse("[syslog]\nmin_level = \"error\"")?;
//! # Ok(())
//! # }
//! ```

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SysfwdError};
use crate::types::{Facility, FilterMode, Severity};

/// 허용되는 최소 패킷 크기 (바이트)
pub const MIN_PACKET_SIZE: usize = 64;

/// 허용되는 최대 패킷 크기 (IPv4 UDP 페이로드 한계)
pub const MAX_PACKET_SIZE: usize = 65_507;

/// sysfwd 통합 설정
///
/// `sysfwd.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SysfwdConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// syslog 포워더 설정
    #[serde(default)]
    pub syslog: SyslogConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SysfwdConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SysfwdError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SysfwdError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SysfwdError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SysfwdError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SysfwdError> {
        toml::from_str(toml_str).map_err(|e| {
            SysfwdError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SYSFWD_{SECTION}_{FIELD}`
    /// 예: `SYSFWD_SYSLOG_SERVER_ADDRESS=192.168.1.10`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SYSFWD_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SYSFWD_GENERAL_LOG_FORMAT");

        // Syslog
        let syslog = &mut self.syslog;
        override_string(&mut syslog.server_address, "SYSFWD_SYSLOG_SERVER_ADDRESS");
        override_u16(&mut syslog.port, "SYSFWD_SYSLOG_PORT");
        override_opt_string(&mut syslog.client_id, "SYSFWD_SYSLOG_CLIENT_ID");
        override_bool(&mut syslog.enable_logger, "SYSFWD_SYSLOG_ENABLE_LOGGER");
        override_bool(
            &mut syslog.enable_direct_logs,
            "SYSFWD_SYSLOG_ENABLE_DIRECT_LOGS",
        );
        override_bool(&mut syslog.globally_enabled, "SYSFWD_SYSLOG_GLOBALLY_ENABLED");
        override_bool(&mut syslog.strip_colors, "SYSFWD_SYSLOG_STRIP_COLORS");
        override_string(&mut syslog.min_level, "SYSFWD_SYSLOG_MIN_LEVEL");
        if let Ok(val) = std::env::var("SYSFWD_SYSLOG_FILTER_MODE") {
            syslog.filter_mode = FilterModeSetting::Name(val);
        }
        override_csv(&mut syslog.filters, "SYSFWD_SYSLOG_FILTERS");
        override_string(&mut syslog.filter_string, "SYSFWD_SYSLOG_FILTER_STRING");
        override_string(&mut syslog.logger_prefix, "SYSFWD_SYSLOG_LOGGER_PREFIX");
        override_string(&mut syslog.direct_prefix, "SYSFWD_SYSLOG_DIRECT_PREFIX");
        override_string(&mut syslog.facility, "SYSFWD_SYSLOG_FACILITY");
        override_bool(
            &mut syslog.include_timestamp,
            "SYSFWD_SYSLOG_INCLUDE_TIMESTAMP",
        );
        override_usize(&mut syslog.max_packet_size, "SYSFWD_SYSLOG_MAX_PACKET_SIZE");
        override_opt_string(
            &mut syslog.filter_state_path,
            "SYSFWD_SYSLOG_FILTER_STATE_PATH",
        );

        // Metrics
        override_bool(&mut self.metrics.enabled, "SYSFWD_METRICS_ENABLED");
        override_string(&mut self.metrics.listen_addr, "SYSFWD_METRICS_LISTEN_ADDR");
        override_u16(&mut self.metrics.port, "SYSFWD_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SysfwdError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        self.syslog.validate()?;

        if self.metrics.enabled {
            if self.metrics.listen_addr.parse::<IpAddr>().is_err() {
                return Err(invalid(
                    "metrics.listen_addr",
                    format!("'{}' is not an IP address", self.metrics.listen_addr),
                ));
            }
            if self.metrics.port == 0 {
                return Err(invalid("metrics.port", "must be 1-65535".to_owned()));
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 필터 모드 설정값
///
/// `"include"` / `"exclude"` 문자열 또는 불리언(`true` = include)을 받습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterModeSetting {
    /// `true` = include, `false` = exclude
    Flag(bool),
    /// `include` / `exclude` (대소문자 무시)
    Name(String),
}

impl FilterModeSetting {
    /// 설정값을 [`FilterMode`]로 해석합니다.
    pub fn resolve(&self) -> Option<FilterMode> {
        match self {
            Self::Flag(include) => Some(FilterMode::from_include_flag(*include)),
            Self::Name(name) => FilterMode::from_token(name),
        }
    }
}

impl Default for FilterModeSetting {
    fn default() -> Self {
        Self::Name("exclude".to_owned())
    }
}

/// syslog 포워더 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// syslog 서버 IP 주소
    pub server_address: String,
    /// syslog 서버 포트
    pub port: u16,
    /// 클라이언트 식별자 (미설정 시 호스트명)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// 로거 훅 메시지 전달 여부
    pub enable_logger: bool,
    /// 직접 호출 로그 전달 여부
    pub enable_direct_logs: bool,
    /// 전역 활성화 여부
    pub globally_enabled: bool,
    /// ANSI 색상 코드 제거 여부
    pub strip_colors: bool,
    /// 최소 레벨 이름 (대소문자 무시)
    pub min_level: String,
    /// 필터 모드
    pub filter_mode: FilterModeSetting,
    /// 정적 필터 태그 목록
    pub filters: Vec<String>,
    /// 쉼표 구분 필터 문자열 (비어 있지 않으면 `filters`보다 우선)
    pub filter_string: String,
    /// 로거 훅 메시지 접두어
    pub logger_prefix: String,
    /// 직접 호출 메시지 접두어
    pub direct_prefix: String,
    /// syslog facility 이름
    pub facility: String,
    /// 패킷에 타임스탬프 포함 여부
    pub include_timestamp: bool,
    /// 최대 패킷 크기 (바이트)
    pub max_packet_size: usize,
    /// 필터 문자열 저장 파일 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_state_path: Option<String>,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            server_address: "255.255.255.255".to_owned(),
            port: 514,
            client_id: None,
            enable_logger: true,
            enable_direct_logs: true,
            globally_enabled: true,
            strip_colors: true,
            min_level: "DEBUG".to_owned(),
            filter_mode: FilterModeSetting::default(),
            filters: Vec::new(),
            filter_string: String::new(),
            logger_prefix: String::new(),
            direct_prefix: String::new(),
            facility: "user".to_owned(),
            include_timestamp: true,
            max_packet_size: 1024,
            filter_state_path: None,
        }
    }
}

impl SyslogConfig {
    /// syslog 섹션의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SysfwdError> {
        if self.server_address.trim().parse::<IpAddr>().is_err() {
            return Err(invalid(
                "syslog.server_address",
                format!("'{}' is not an IP address", self.server_address),
            ));
        }

        if self.port == 0 {
            return Err(invalid("syslog.port", "must be 1-65535".to_owned()));
        }

        if self.min_level.trim().eq_ignore_ascii_case("NONE") {
            return Err(invalid(
                "syslog.min_level",
                "'NONE' would forward nothing; set globally_enabled = false instead".to_owned(),
            ));
        }

        if Severity::from_name(&self.min_level).is_none() {
            return Err(invalid(
                "syslog.min_level",
                format!(
                    "unknown level '{}', valid options are {}",
                    self.min_level,
                    Severity::ALL
                        .iter()
                        .map(|s| s.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ));
        }

        if self.filter_mode.resolve().is_none() {
            return Err(invalid(
                "syslog.filter_mode",
                "must be either 'include', 'exclude', true (include), or false (exclude)"
                    .to_owned(),
            ));
        }

        if Facility::from_name(&self.facility).is_none() {
            return Err(invalid(
                "syslog.facility",
                format!("unknown facility '{}'", self.facility),
            ));
        }

        if let Some(client_id) = &self.client_id {
            if client_id.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(invalid(
                    "syslog.client_id",
                    "must not contain whitespace or control characters".to_owned(),
                ));
            }
        }

        if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&self.max_packet_size) {
            return Err(invalid(
                "syslog.max_packet_size",
                format!("must be {}-{}", MIN_PACKET_SIZE, MAX_PACKET_SIZE),
            ));
        }

        Ok(())
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9514,
        }
    }
}

fn invalid(field: &str, reason: String) -> SysfwdError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = if val.is_empty() { None } else { Some(val) };
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
