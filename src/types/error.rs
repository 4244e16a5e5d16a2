//! Error types for Lectern
//!
//! Every failure is converted into an HTTP response at the request boundary;
//! nothing propagates past the handler that detected it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error};

/// Body sent with every 401
pub const NOT_ALLOWED: &str = "Not Allowed";

/// Body sent with a 404 from the read route
pub const NO_ARTICLE_FOUND: &str = "No Article Found";

/// Main error type for Lectern operations
#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    /// Token present but rejected by the identity provider
    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    #[error("{}", NOT_ALLOWED)]
    Unauthorized,

    #[error("No article named {0}")]
    NotFound(String),

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Database error: {0}")]
    Database(String),

    /// Identity provider unreachable or misbehaving
    #[error("Identity provider error: {0}")]
    Verifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LecternError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Verifier(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LecternError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            // No reason is surfaced to the client for a rejected token
            Self::InvalidToken(reason) => {
                debug!(%reason, "Rejected identity token");
                status.into_response()
            }
            Self::Unauthorized => (status, Json(NOT_ALLOWED)).into_response(),
            Self::NotFound(_) => (status, NO_ARTICLE_FOUND).into_response(),
            other => {
                error!(error = %other, "Request failed");
                let reason = status.canonical_reason().unwrap_or("Server Error");
                (status, reason).into_response()
            }
        }
    }
}

impl From<std::io::Error> for LecternError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for LecternError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {}", err))
    }
}

impl From<mongodb::error::Error> for LecternError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for LecternError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidToken(format!("JWT error: {}", err))
    }
}

impl From<reqwest::Error> for LecternError {
    fn from(err: reqwest::Error) -> Self {
        Self::Verifier(err.to_string())
    }
}

/// Result type alias for Lectern operations
pub type Result<T> = std::result::Result<T, LecternError>;
