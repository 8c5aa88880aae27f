//! Moderator identity extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::error::ApiError;

/// Header carrying the acting moderator's username.
pub const MODERATOR_HEADER: &str = "x-moderator";

/// Username of the moderator making the request.
///
/// Set by the platform integration in front of this service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moderator(pub String);

impl<S> FromRequestParts<S> for Moderator
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(MODERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Self(name.to_string()))
            .ok_or(ApiError::MissingModerator)
    }
}
