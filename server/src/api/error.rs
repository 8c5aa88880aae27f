//! API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::db::StoreError;
use crate::fanout::{FanOutError, ValidationFailed};
use crate::notice::Notice;

/// HTTP-facing error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No `X-Moderator` header on the request.
    #[error("Missing moderator header")]
    MissingModerator,

    /// Path community did not normalize to a valid name.
    #[error("Invalid community name: {0}")]
    InvalidCommunity(String),

    /// Community is banned, private or missing.
    #[error("Community not found: r/{0}")]
    CommunityNotFound(String),

    /// Target comment or post no longer exists.
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    /// Content belongs to another community than the one in the path.
    #[error("Content {0} was not posted in this community")]
    ContentMismatch(String),

    /// Content is not the kind of item the action form was opened on.
    #[error("Content {0} does not match the opened action form")]
    LocationMismatch(String),

    /// No open action session for this moderator.
    #[error("No action in progress; open the action form again")]
    SessionNotFound,

    /// Moderator lacks the required permissions.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Fan-out refused in the origin community. Carries the notices
    /// raised before the refusal.
    #[error("Forbidden: missing moderator permissions in r/{community}")]
    ActionDenied {
        community: String,
        notices: Vec<Notice>,
    },

    /// Action form rejected before any side effect.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailed),

    /// Configuration or session store failure.
    #[error("Store error")]
    Store(#[from] StoreError),

    /// Platform call failure.
    #[error("Backend error")]
    Backend(#[from] BackendError),
}

impl From<FanOutError> for ApiError {
    fn from(err: FanOutError) -> Self {
        match err {
            FanOutError::PermissionDenied(community) => {
                Self::Forbidden(format!("missing moderator permissions in r/{community}"))
            }
            FanOutError::CapabilityLookup { source, .. } => Self::Backend(source),
        }
    }
}

/// Error response body for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::MissingModerator => (StatusCode::UNAUTHORIZED, "MISSING_MODERATOR"),
            Self::InvalidCommunity(_) => (StatusCode::BAD_REQUEST, "INVALID_COMMUNITY"),
            Self::CommunityNotFound(_) => (StatusCode::NOT_FOUND, "COMMUNITY_NOT_FOUND"),
            Self::ContentNotFound(_) => (StatusCode::NOT_FOUND, "CONTENT_NOT_FOUND"),
            Self::ContentMismatch(_) => (StatusCode::BAD_REQUEST, "CONTENT_MISMATCH"),
            Self::LocationMismatch(_) => (StatusCode::BAD_REQUEST, "LOCATION_MISMATCH"),
            Self::SessionNotFound => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::ActionDenied { notices, .. } => {
                let body = json!({
                    "error": "FORBIDDEN",
                    "message": self.to_string(),
                    "notices": notices,
                });
                return (StatusCode::FORBIDDEN, Json(body)).into_response();
            }
            Self::Validation(failed) => {
                let body = json!({
                    "error": "VALIDATION_ERROR",
                    "message": failed.message,
                    "field": failed.field,
                    "input": failed.input,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            Self::Store(err) => {
                tracing::error!("Store error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            Self::Backend(err) => {
                tracing::error!("Backend error: {}", err);
                (StatusCode::BAD_GATEWAY, "BACKEND_ERROR")
            }
        };

        let body = ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
