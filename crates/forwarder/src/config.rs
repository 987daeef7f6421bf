//! 포워더 설정
//!
//! [`ForwarderConfig`]는 core의 [`SyslogConfig`]를 해석한 타입 있는 설정입니다.
//! 문자열로 받은 주소, 레벨, 필터 모드, facility를 한 번 검증하고 변환해 두므로
//! 엔진은 런타임에 문자열을 다시 파싱하지 않습니다.
//!
//! # 사용 예시
//! ```ignore
//! use sysfwd_core::config::SysfwdConfig;
//! use sysfwd_forwarder::config::ForwarderConfig;
//!
//! let core_config = SysfwdConfig::default();
//! let config = ForwarderConfig::from_core(&core_config.syslog)?;
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sysfwd_core::config::{MAX_PACKET_SIZE, MIN_PACKET_SIZE, SyslogConfig};
use sysfwd_core::types::{Facility, FilterMode, Severity};

use crate::error::ForwarderError;
use crate::filter::parse_filter_list;

/// 호스트명을 얻지 못했을 때 쓰는 클라이언트 ID
pub const FALLBACK_CLIENT_ID: &str = "sysfwd";

/// 포워더 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// syslog 서버 주소
    pub server: SocketAddr,
    /// 클라이언트 식별자 (RFC 5424 HOSTNAME 필드)
    pub client_id: String,
    /// 로거 훅 메시지 전달 여부
    pub enable_logger: bool,
    /// 직접 호출 로그 전달 여부
    pub enable_direct_logs: bool,
    /// 전역 활성화 여부
    pub globally_enabled: bool,
    /// ANSI 색상 코드 제거 여부
    pub strip_colors: bool,
    /// 최소 레벨 (이 값 이하의 숫자만 통과)
    pub min_level: Severity,
    /// 필터 모드
    pub filter_mode: FilterMode,
    /// 정적 필터 태그 목록
    pub filters: Vec<String>,
    /// 쉼표 구분 필터 문자열
    pub filter_string: String,
    /// 로거 훅 메시지 접두어
    pub logger_prefix: String,
    /// 직접 호출 메시지 접두어
    pub direct_prefix: String,
    /// syslog facility
    pub facility: Facility,
    /// 타임스탬프 포함 여부
    pub include_timestamp: bool,
    /// 최대 패킷 크기 (바이트)
    pub max_packet_size: usize,
    /// 필터 문자열 저장 파일
    pub filter_state_path: Option<PathBuf>,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            server: SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), 514),
            client_id: default_client_id(),
            enable_logger: true,
            enable_direct_logs: true,
            globally_enabled: true,
            strip_colors: true,
            min_level: Severity::Debug,
            filter_mode: FilterMode::Exclude,
            filters: Vec::new(),
            filter_string: String::new(),
            logger_prefix: String::new(),
            direct_prefix: String::new(),
            facility: Facility::User,
            include_timestamp: true,
            max_packet_size: 1024,
            filter_state_path: None,
        }
    }
}

impl ForwarderConfig {
    /// core의 `SyslogConfig`에서 포워더 설정을 생성합니다.
    ///
    /// 잘못된 레벨 이름, 필터 모드 토큰, 주소는 여기서 거부되며
    /// 엔진 생성으로 이어지지 않습니다.
    pub fn from_core(core: &SyslogConfig) -> Result<Self, ForwarderError> {
        let ip: IpAddr = core.server_address.trim().parse().map_err(|_| {
            ForwarderError::config(
                "syslog.server_address",
                format!("'{}' is not an IP address", core.server_address),
            )
        })?;

        let min_level = Severity::from_name(&core.min_level).ok_or_else(|| {
            ForwarderError::config(
                "syslog.min_level",
                format!("unknown level '{}'", core.min_level),
            )
        })?;

        let filter_mode = core.filter_mode.resolve().ok_or_else(|| {
            ForwarderError::config(
                "syslog.filter_mode",
                "must be either 'include', 'exclude', true or false",
            )
        })?;

        let facility = Facility::from_name(&core.facility).ok_or_else(|| {
            ForwarderError::config(
                "syslog.facility",
                format!("unknown facility '{}'", core.facility),
            )
        })?;

        let client_id = match core.client_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_owned(),
            _ => default_client_id(),
        };

        let config = Self {
            server: SocketAddr::new(ip, core.port),
            client_id,
            enable_logger: core.enable_logger,
            enable_direct_logs: core.enable_direct_logs,
            globally_enabled: core.globally_enabled,
            strip_colors: core.strip_colors,
            min_level,
            filter_mode,
            filters: core.filters.clone(),
            filter_string: core.filter_string.clone(),
            logger_prefix: core.logger_prefix.clone(),
            direct_prefix: core.direct_prefix.clone(),
            facility,
            include_timestamp: core.include_timestamp,
            max_packet_size: core.max_packet_size,
            filter_state_path: core.filter_state_path.as_ref().map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ForwarderError> {
        if self.server.port() == 0 {
            return Err(ForwarderError::config("syslog.port", "must be 1-65535"));
        }

        validate_client_id(&self.client_id)?;

        if !(MIN_PACKET_SIZE..=MAX_PACKET_SIZE).contains(&self.max_packet_size) {
            return Err(ForwarderError::config(
                "syslog.max_packet_size",
                format!("must be {}-{}", MIN_PACKET_SIZE, MAX_PACKET_SIZE),
            ));
        }

        Ok(())
    }

    /// 설정에 명시된 초기 필터 집합을 반환합니다.
    ///
    /// 비어 있지 않은 `filter_string`이 정적 `filters`보다 우선합니다.
    /// 둘 다 비어 있으면 `None`을 반환하며, 이때 엔진은 저장된 필터 문자열을 찾습니다.
    pub fn configured_filters(&self) -> Option<Vec<String>> {
        if !self.filter_string.trim().is_empty() {
            return Some(parse_filter_list(&self.filter_string).into_iter().collect());
        }
        let statics: Vec<String> = self
            .filters
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect();
        if statics.is_empty() { None } else { Some(statics) }
    }
}

/// 클라이언트 ID를 검증합니다.
pub(crate) fn validate_client_id(client_id: &str) -> Result<(), ForwarderError> {
    if client_id.is_empty() {
        return Err(ForwarderError::config(
            "syslog.client_id",
            "must not be empty",
        ));
    }
    if client_id
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ForwarderError::config(
            "syslog.client_id",
            "must not contain whitespace or control characters",
        ));
    }
    Ok(())
}

/// 장치 식별자로 쓸 호스트명을 조회합니다.
pub fn default_client_id() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .map(|name| name.trim().replace(char::is_whitespace, "-"))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_CLIENT_ID.to_owned())
}

/// 포워더 설정 빌더
#[derive(Default)]
pub struct ForwarderConfigBuilder {
    config: ForwarderConfig,
}

impl ForwarderConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 서버 주소를 설정합니다.
    pub fn server(mut self, server: SocketAddr) -> Self {
        self.config.server = server;
        self
    }

    /// 클라이언트 ID를 설정합니다.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.client_id = client_id.into();
        self
    }

    /// 로거 훅 메시지 전달 여부를 설정합니다.
    pub fn enable_logger(mut self, enabled: bool) -> Self {
        self.config.enable_logger = enabled;
        self
    }

    /// 직접 호출 로그 전달 여부를 설정합니다.
    pub fn enable_direct_logs(mut self, enabled: bool) -> Self {
        self.config.enable_direct_logs = enabled;
        self
    }

    /// 전역 활성화 여부를 설정합니다.
    pub fn globally_enabled(mut self, enabled: bool) -> Self {
        self.config.globally_enabled = enabled;
        self
    }

    /// ANSI 색상 코드 제거 여부를 설정합니다.
    pub fn strip_colors(mut self, strip: bool) -> Self {
        self.config.strip_colors = strip;
        self
    }

    /// 최소 레벨을 설정합니다.
    pub fn min_level(mut self, level: Severity) -> Self {
        self.config.min_level = level;
        self
    }

    /// 필터 모드를 설정합니다.
    pub fn filter_mode(mut self, mode: FilterMode) -> Self {
        self.config.filter_mode = mode;
        self
    }

    /// 정적 필터 목록을 설정합니다.
    pub fn filters<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.filters = tags.into_iter().map(Into::into).collect();
        self
    }

    /// 필터 문자열을 설정합니다.
    pub fn filter_string(mut self, filter_string: impl Into<String>) -> Self {
        self.config.filter_string = filter_string.into();
        self
    }

    /// 로거 훅 접두어를 설정합니다.
    pub fn logger_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.logger_prefix = prefix.into();
        self
    }

    /// 직접 호출 접두어를 설정합니다.
    pub fn direct_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.direct_prefix = prefix.into();
        self
    }

    /// facility를 설정합니다.
    pub fn facility(mut self, facility: Facility) -> Self {
        self.config.facility = facility;
        self
    }

    /// 타임스탬프 포함 여부를 설정합니다.
    pub fn include_timestamp(mut self, include: bool) -> Self {
        self.config.include_timestamp = include;
        self
    }

    /// 최대 패킷 크기를 설정합니다.
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.config.max_packet_size = size;
        self
    }

    /// 필터 저장 파일 경로를 설정합니다.
    pub fn filter_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.filter_state_path = Some(path.into());
        self
    }

    /// 설정을 검증하고 `ForwarderConfig`를 생성합니다.
    pub fn build(self) -> Result<ForwarderConfig, ForwarderError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
