//! 공통 에러 타입
//!
//! ticketkit 전체에서 사용되는 에러 타입을 정의합니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// ticketkit 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("configuration error: {message}")]
    Configuration { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Credential Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("missing credentials")]
    MissingCredentials,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("malformed token")]
    MalformedToken,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    TokenExpired,

    // ─────────────────────────────────────────────────────────────────────────────
    // Authorization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("insufficient role")]
    InsufficientRole,

    #[error("access denied")]
    Forbidden,

    // ─────────────────────────────────────────────────────────────────────────────
    // Resource/Validation Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("validation error: {message}")]
    Validation { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Validation { .. } => 400,

            // 401 Unauthorized
            Error::MissingCredentials
            | Error::MalformedHeader
            | Error::MalformedToken
            | Error::InvalidSignature
            | Error::TokenExpired => 401,

            // 403 Forbidden
            Error::InsufficientRole | Error::Forbidden => 403,

            // 404 Not Found
            Error::NotFound { .. } => 404,

            // 500 Internal Server Error
            Error::Configuration { .. } | Error::Json(_) => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::Configuration { .. } => "CONFIGURATION_ERROR",
            Error::MissingCredentials => "MISSING_CREDENTIALS",
            Error::MalformedHeader => "MALFORMED_HEADER",
            Error::MalformedToken => "MALFORMED_TOKEN",
            Error::InvalidSignature => "INVALID_SIGNATURE",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::InsufficientRole => "INSUFFICIENT_ROLE",
            Error::Forbidden => "FORBIDDEN",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::MissingCredentials.status_code(), 401);
        assert_eq!(Error::InvalidSignature.status_code(), 401);
        assert_eq!(Error::TokenExpired.status_code(), 401);
        assert_eq!(Error::InsufficientRole.status_code(), 403);
        assert_eq!(Error::Forbidden.status_code(), 403);
        assert_eq!(Error::NotFound { resource: "ticket" }.status_code(), 404);
        assert_eq!(
            Error::Validation {
                message: "bad".to_string()
            }
            .status_code(),
            400
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(Error::TokenExpired.code(), "TOKEN_EXPIRED");
        assert_eq!(Error::Forbidden.code(), "FORBIDDEN");
        assert_eq!(Error::NotFound { resource: "ticket" }.code(), "NOT_FOUND");
    }
}
