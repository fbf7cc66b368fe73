use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Every failure a handler can report. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing request fields.
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthenticated,

    /// Authenticated, but not allowed to perform the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Conflict(String),

    /// The store failed; `context` names the operation, `cause` is logged
    /// but not sent to the client.
    #[error("{context}: {cause}")]
    Storage {
        context: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    /// `map_err` adapter for storage results.
    pub fn storage(context: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| Self::Storage { context, cause }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateUsername => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Storage { context, cause } => {
                error!(error = %cause, "{}", context);
                (*context).to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
