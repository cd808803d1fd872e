use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Typed failure surface shared by guards, handlers and repos.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("insufficient privileges")]
    Forbidden,

    #[error("invalid or expired session token")]
    InvalidToken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already in use")]
    EmailInUse,

    #[error("already applied")]
    AlreadyApplied,

    #[error("not found")]
    NotFound,

    #[error("invalid input: {0}")]
    Validation(String),

    /// A write touched an unexpected number of rows.
    #[error("store affected an unexpected row count")]
    Persistence,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::EmailInUse | ApiError::AlreadyApplied => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Persistence | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details stay in the logs, not in the response body.
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_failures_map_to_auth_statuses() {
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(ApiError::EmailInUse.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::AlreadyApplied.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn persistence_inconsistency_is_a_server_error() {
        assert_eq!(
            ApiError::Persistence.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
