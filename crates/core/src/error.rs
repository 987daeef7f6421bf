//! 에러 타입 -- 도메인별 에러 정의
//!
//! 설정 에러는 기동 시점에만 발생하며 엔진 생성을 막습니다.
//! 전송 에러는 런타임에 조용히 흡수되므로 핫 패스에서는 전파되지 않습니다.

/// sysfwd 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SysfwdError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 전송 계층 에러
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// 필터 저장소 에러
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 전송 계층 에러
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// 서버 주소 파싱 실패
    #[error("invalid server address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// UDP 소켓 생성/설정 실패
    #[error("socket setup failed: {0}")]
    SocketSetup(String),

    /// 데이터그램 전송 실패
    #[error("send failed: {0}")]
    Send(String),
}

/// 필터 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 저장된 필터 문자열 읽기 실패
    #[error("failed to read filter state from {path}: {reason}")]
    Read { path: String, reason: String },

    /// 필터 문자열 저장 실패
    #[error("failed to write filter state to {path}: {reason}")]
    Write { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_field() {
        let err = ConfigError::InvalidValue {
            field: "syslog.min_level".to_owned(),
            reason: "unknown level 'LOUD'".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("syslog.min_level"));
        assert!(msg.contains("LOUD"));
    }

    #[test]
    fn transport_error_converts_to_top_level() {
        let err: SysfwdError = TransportError::Send("no route to host".to_owned()).into();
        assert!(matches!(err, SysfwdError::Transport(_)));
        assert!(err.to_string().contains("no route to host"));
    }

    #[test]
    fn store_error_display_includes_path() {
        let err = StoreError::Write {
            path: "/var/lib/sysfwd/filters".to_owned(),
            reason: "read-only file system".to_owned(),
        };
        assert!(err.to_string().contains("/var/lib/sysfwd/filters"));
    }
}
