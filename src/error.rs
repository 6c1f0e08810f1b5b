use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler or the auth gate can fail with. Each variant maps to
/// one status code; the body is always `{"message": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered. Please try with different email.")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Token is missing")]
    TokenMissing,
    #[error("Token is invalid or expired")]
    TokenInvalid,
    #[error("User not found")]
    UserNotFound,
    #[error("{0}")]
    NotFound(String),
    #[error("Database error occurred. Please try again.")]
    Database(#[from] sqlx::Error),
    #[error("Something went wrong")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::EmailTaken => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::TokenMissing | ApiError::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::UserNotFound | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Database(e) => error!(error = %e, "database error"),
            ApiError::Internal(e) => error!(error = %e, "internal error"),
            _ => {}
        }
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_stay_distinguishable() {
        assert_eq!(ApiError::TokenMissing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::TokenInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        // Same status, different message: clients still tell them apart.
        assert_ne!(
            ApiError::TokenMissing.to_string(),
            ApiError::TokenInvalid.to_string()
        );
    }

    #[test]
    fn database_errors_hide_details() {
        let e = ApiError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(e.to_string(), "Database error occurred. Please try again.");
    }
}
