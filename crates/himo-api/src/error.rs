use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use himo_types::api::ErrorResponse;

use crate::response;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Validation
    #[error("{0}")]
    InvalidInput(String),

    // Authentication
    #[error("Invalid credentials")]
    InvalidCredentials,

    // Authorization
    #[error("Account is banned")]
    AccountBanned,
    #[error("Access denied")]
    AccessDenied,
    #[error("Not a member of this chat")]
    NotAMember,

    // Conflict
    #[error("Username already exists")]
    UsernameTaken,

    #[error("Method not allowed")]
    MethodNotAllowed,

    // Infrastructure
    #[error("Could not generate unique HIM ID")]
    IdGenerationExhausted,
    #[error("Database connection not configured")]
    StoreNotConfigured,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountBanned | Self::AccessDenied | Self::NotAMember => StatusCode::FORBIDDEN,
            Self::UsernameTaken => StatusCode::CONFLICT,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::IdGenerationExhausted | Self::StoreNotConfigured | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            // Store errors can carry SQL and paths; keep them in the log only.
            Self::Internal(e) => {
                error!("Server error: {:#}", e);
                "Server error".to_string()
            }
            other => other.to_string(),
        };

        response::json(self.status(), &ErrorResponse { error: message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(ApiError::invalid("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotAMember.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::AccessDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::UsernameTaken.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("no such table")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_errors_are_not_echoed() {
        let res = ApiError::Internal(anyhow::anyhow!("no such table: users")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"Server error"}"#);
    }
}
