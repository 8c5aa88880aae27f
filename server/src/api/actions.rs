//! Moderator Actions API
//!
//! Two-step flow: opening the action form records what the moderator
//! acted on, submitting it consumes that record and fans the action out.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use super::error::ApiError;
use super::moderator::Moderator;
use super::{community_from_path, require_permissions, AppState};
use crate::backend::CommunityRef;
use crate::fanout::{
    ActionForm, ActionRequest, DestinationOutcome, Failure, FanOutError, FanOutReport, NOTHING_TO_DO,
};
use crate::notice::{notice_channel, Notice, NoticeSink, Severity};
use crate::permissions::ModPermissions;
use crate::policy::{to_lines, CommunityId};
use crate::session::{session_key, ActionContext};

#[derive(Debug, Serialize)]
pub struct ActionContextResponse {
    pub community: CommunityId,
    /// Form pre-filled with the community's defaults.
    pub defaults: ActionForm,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub banned: Option<usize>,
    pub noted: Option<usize>,
    pub failures: Vec<Failure>,
    pub outcomes: Vec<DestinationOutcome>,
    pub notices: Vec<Notice>,
}

impl ActionResponse {
    fn new(report: FanOutReport, notices: Vec<Notice>) -> Self {
        Self {
            banned: report.banned,
            noted: report.noted,
            failures: report.failures,
            outcomes: report.outcomes,
            notices,
        }
    }
}

/// Record the content the moderator opened the form on.
///
/// POST /api/communities/{community}/actions/context
#[tracing::instrument(skip(state, context), fields(moderator = %moderator.0, target = %context.target_id))]
pub async fn open_action(
    State(state): State<AppState>,
    moderator: Moderator,
    Path(community): Path<String>,
    Json(context): Json<ActionContext>,
) -> Result<Json<ActionContextResponse>, ApiError> {
    let community = community_from_path(&community)?;
    require_permissions(&state, &moderator, &community, ModPermissions::can_moderate).await?;

    let key = session_key(&state.config.session_key_prefix, &moderator.0);
    state.sessions.create(&key, &context).await?;

    let policy = state.policies.load(&community).await?;
    let others = to_lines(&policy.defaults.other_subreddits);
    let defaults = ActionForm {
        user_message: policy.defaults.default_user_message,
        ban_subreddits: others.clone(),
        note_subreddits: others,
        ..ActionForm::default()
    };

    info!("Action form opened");
    Ok(Json(ActionContextResponse {
        community,
        defaults,
    }))
}

/// Submit the action form and fan the action out.
///
/// POST /api/communities/{community}/actions
#[tracing::instrument(skip(state, form), fields(moderator = %moderator.0))]
pub async fn submit_action(
    State(state): State<AppState>,
    moderator: Moderator,
    Path(community): Path<String>,
    Json(form): Json<ActionForm>,
) -> Result<Json<ActionResponse>, ApiError> {
    let community = community_from_path(&community)?;
    // Rejected forms leave the session in place so the moderator can retry.
    form.validate()?;
    if form.selects_nothing() {
        let (sink, mut receiver) = notice_channel();
        sink.notify(NOTHING_TO_DO.to_string(), Severity::Neutral);
        return Ok(Json(ActionResponse::new(
            FanOutReport::nothing_to_do(),
            receiver.drain(),
        )));
    }

    let key = session_key(&state.config.session_key_prefix, &moderator.0);
    let context = state
        .sessions
        .consume(&key)
        .await?
        .ok_or(ApiError::SessionNotFound)?;

    let item = state
        .backend
        .fetch_content(&context.target_id)
        .await?
        .ok_or_else(|| ApiError::ContentNotFound(context.target_id.clone()))?;
    if !context.location.matches(&item) {
        return Err(ApiError::LocationMismatch(context.target_id));
    }
    if CommunityId::parse(item.subreddit_name()).as_ref() != Some(&community) {
        return Err(ApiError::ContentMismatch(context.target_id));
    }

    let origin = resolve_origin(&state, &community).await?;
    let request = ActionRequest::from_form(form, moderator.0, origin, item)?;

    let (sink, mut receiver) = notice_channel();
    let sink: Arc<dyn NoticeSink> = Arc::new(sink);
    let result = state.coordinator.execute(request, sink).await;
    let notices = receiver.drain();

    let report = match result {
        Ok(report) => report,
        Err(FanOutError::PermissionDenied(community)) => {
            return Err(ApiError::ActionDenied {
                community: community.to_string(),
                notices,
            });
        }
        Err(err) => return Err(err.into()),
    };
    Ok(Json(ActionResponse::new(report, notices)))
}

async fn resolve_origin(state: &AppState, community: &CommunityId) -> Result<CommunityRef, ApiError> {
    state
        .backend
        .resolve_community(community)
        .await?
        .ok_or_else(|| ApiError::CommunityNotFound(community.to_string()))
}
