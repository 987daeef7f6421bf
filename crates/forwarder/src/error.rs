//! 포워더 에러 타입
//!
//! [`ForwarderError`]는 엔진 생성과 런타임 재설정(서버 변경, 클라이언트 ID 변경)
//! 경로에서만 발생합니다. 로그 핫 패스는 에러를 반환하지 않습니다.
//! `From<ForwarderError> for SysfwdError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 전파할 수 있습니다.

use sysfwd_core::error::{ConfigError, StoreError, SysfwdError, TransportError};

/// 포워더 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ForwarderError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 전송 계층 에러 (소켓 생성 실패 등)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 필터 저장소 에러
    #[error(transparent)]
    Store(#[from] StoreError),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl ForwarderError {
    pub(crate) fn config(field: &str, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

impl From<ForwarderError> for SysfwdError {
    fn from(err: ForwarderError) -> Self {
        match err {
            ForwarderError::Config { field, reason } => {
                SysfwdError::Config(ConfigError::InvalidValue { field, reason })
            }
            ForwarderError::Transport(e) => SysfwdError::Transport(e),
            ForwarderError::Store(e) => SysfwdError::Store(e),
            ForwarderError::Regex(e) => SysfwdError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            }),
        }
    }
}
