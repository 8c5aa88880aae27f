//! API Router and Application State
//!
//! Central routing configuration and shared state.

pub mod actions;
pub mod error;
pub mod moderator;
pub mod settings;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::{
    backend::ActionBackend,
    config::Config,
    fanout::FanOutCoordinator,
    permissions::{ModPermissions, PermissionEvaluator},
    policy::{CommunityId, PolicyService},
    session::SessionStore,
};

pub use error::{ApiError, ErrorResponse};
pub use moderator::{Moderator, MODERATOR_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Community policy access
    pub policies: PolicyService,
    /// Action session store
    pub sessions: Arc<dyn SessionStore>,
    /// Platform backend
    pub backend: Arc<dyn ActionBackend>,
    /// Fan-out engine
    pub coordinator: FanOutCoordinator,
}

impl AppState {
    /// Create new application state, wiring the evaluator and coordinator.
    #[must_use]
    pub fn new(
        config: Config,
        policies: PolicyService,
        sessions: Arc<dyn SessionStore>,
        backend: Arc<dyn ActionBackend>,
    ) -> Self {
        let evaluator =
            PermissionEvaluator::new(backend.clone(), policies.clone(), config.app_username.clone());
        let coordinator = FanOutCoordinator::new(backend.clone(), evaluator);
        Self {
            config: Arc::new(config),
            policies,
            sessions,
            backend,
            coordinator,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/communities/{community}/settings",
            get(settings::get_settings).patch(settings::update_settings),
        )
        .route(
            "/api/communities/{community}/actions/context",
            post(actions::open_action),
        )
        .route(
            "/api/communities/{community}/actions",
            post(actions::submit_action),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Normalize the `{community}` path segment.
pub(crate) fn community_from_path(raw: &str) -> Result<CommunityId, ApiError> {
    CommunityId::parse(raw).ok_or_else(|| ApiError::InvalidCommunity(raw.to_string()))
}

/// Reject the request unless `check` passes for the moderator's
/// permissions in `community`.
pub(crate) async fn require_permissions(
    state: &AppState,
    moderator: &Moderator,
    community: &CommunityId,
    check: fn(ModPermissions) -> bool,
) -> Result<(), ApiError> {
    let perms = state.backend.mod_permissions(&moderator.0, community).await?;
    if check(perms) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "u/{} lacks the required permissions in r/{community}",
            moderator.0
        )))
    }
}
