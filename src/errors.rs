use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Wrong password or unknown username. One message for both, so the
    /// response never reveals whether the account exists.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Token malformed, tampered with, expired, or naming a user that no
    /// longer exists.
    #[error("Invalid token")]
    InvalidToken,

    /// Token version no longer matches the stored session version,
    /// meaning a newer login superseded this token.
    #[error("Token invalidated")]
    TokenInvalidated,

    /// The session the token belongs to was logged out.
    #[error("Session invalidated")]
    SessionInvalidated,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::Db(e.to_string())
    }
}

impl AppError {
    /// Machine-readable code for responses where the client branches on
    /// the failure kind rather than parsing prose.
    fn code(&self) -> Option<&'static str> {
        match self {
            AppError::InvalidToken => Some("INVALID_TOKEN"),
            AppError::TokenInvalidated => Some("TOKEN_INVALIDATED"),
            AppError::SessionInvalidated => Some("SESSION_INVALIDATED"),
            AppError::Forbidden => Some("FORBIDDEN"),
            AppError::Db(_) => Some("PERSISTENCE_UNAVAILABLE"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            AppError::Validation(s) => (StatusCode::BAD_REQUEST, s.as_str()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid username or password")
            }
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
            AppError::TokenInvalidated => (
                StatusCode::UNAUTHORIZED,
                "token superseded by a newer login",
            ),
            AppError::SessionInvalidated => (StatusCode::UNAUTHORIZED, "session is logged out"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "insufficient role"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not found"),
            AppError::Conflict(s) => (StatusCode::CONFLICT, s.as_str()),
            AppError::Db(detail) => {
                tracing::error!(%detail, "persistence failure");
                (StatusCode::SERVICE_UNAVAILABLE, "persistence unavailable")
            }
            AppError::Internal(s) => (StatusCode::INTERNAL_SERVER_ERROR, s.as_str()),
        };

        let body = match self.code() {
            Some(code) => json!({ "message": msg, "code": code }),
            None => json!({ "message": msg }),
        };

        (status, Json(body)).into_response()
    }
}
