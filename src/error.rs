//! Error handling for CamGate

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable credentials on the request
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authorization header present but not parseable for the matched scheme
    #[error("Bad authorization header: {0}")]
    MalformedHeader(String),

    /// Token failed verification (signature, key fetch, claim shape)
    #[error("Invalid token: {detail}")]
    InvalidToken {
        detail: String,
        messages: Vec<String>,
    },

    /// Token signature valid but past its expiry
    #[error("Token expired")]
    ExpiredToken,

    /// Facility/principal has no configured trust relationship
    #[error("Untrusted issuer: {0}")]
    UntrustedIssuer(String),

    /// Resource/facility binding violated
    #[error("Scope mismatch: {0}")]
    ScopeMismatch(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Cache error (lock state backend)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// SQLx database error
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl Error {
    /// Token verification failure without upstream messages. The underlying
    /// cause is logged at the verification site; only the detail string
    /// travels to the client.
    pub fn invalid_token(detail: impl Into<String>) -> Self {
        Error::InvalidToken {
            detail: detail.into(),
            messages: Vec::new(),
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::Cache(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_FAILED",
                msg.clone(),
            ),
            Error::MalformedHeader(msg) => (
                StatusCode::UNAUTHORIZED,
                "BAD_AUTHORIZATION_HEADER",
                msg.clone(),
            ),
            Error::InvalidToken { detail, .. } => {
                (StatusCode::UNAUTHORIZED, "INVALID_TOKEN", detail.clone())
            }
            Error::ExpiredToken => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_EXPIRED",
                "Token expired, please relogin to continue".to_string(),
            ),
            Error::UntrustedIssuer(msg) => {
                (StatusCode::UNAUTHORIZED, "UNTRUSTED_ISSUER", msg.clone())
            }
            Error::ScopeMismatch(msg) => {
                (StatusCode::UNAUTHORIZED, "SCOPE_MISMATCH", msg.clone())
            }
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Cache(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CACHE_ERROR",
                msg.clone(),
            ),
            Error::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                msg.clone(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
            Error::Sqlx(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                e.to_string(),
            ),
        };

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(
                error_code = %error_code,
                message = %message,
                "Authentication rejected"
            );
        } else {
            tracing::error!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request error"
            );
        }

        let messages = match self {
            Error::InvalidToken { messages, .. } => messages,
            _ => Vec::new(),
        };

        let body = Json(json!({
            "error_code": error_code,
            "message": message,
            "messages": messages
        }));

        (status, body).into_response()
    }
}
