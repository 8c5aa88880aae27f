//! Cross-community permission evaluation.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::{ActionBackend, BackendError};
use crate::db::StoreError;
use crate::notice::{NoticeSink, Severity};
use crate::policy::{ActionClass, CommunityId, PolicyService};

/// Outcome of evaluating one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Permitted,
    /// The moderator or the app account lacks moderator capability.
    DeniedByPermission,
    /// The destination's trust policy rejects the origin.
    DeniedByPolicy,
}

/// A collaborator failed while evaluating.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Moderator lookup failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Policy lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Decides whether an action may proceed in a destination community.
#[derive(Clone)]
pub struct PermissionEvaluator {
    backend: Arc<dyn ActionBackend>,
    policies: PolicyService,
    app_username: String,
}

impl PermissionEvaluator {
    pub fn new(
        backend: Arc<dyn ActionBackend>,
        policies: PolicyService,
        app_username: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            policies,
            app_username: app_username.into(),
        }
    }

    /// The account the app acts as.
    pub fn app_username(&self) -> &str {
        &self.app_username
    }

    /// Whether `username` holds `all` or `access` moderator permissions in `community`.
    pub async fn has_capability(
        &self,
        username: &str,
        community: &CommunityId,
    ) -> Result<bool, BackendError> {
        let perms = self.backend.mod_permissions(username, community).await?;
        debug!(user = %username, community = %community, permissions = ?perms, "Moderator permissions");
        Ok(perms.can_moderate())
    }

    /// Evaluate both gates for one destination.
    ///
    /// Capability is checked first; when the app account is not a
    /// moderator of a foreign destination the policy is never loaded.
    /// The policy gate is skipped when `destination == origin`.
    /// Denials emit one notice naming the destination.
    #[tracing::instrument(
        skip(self, notices),
        fields(action = %action, origin = %origin, destination = %destination)
    )]
    pub async fn evaluate(
        &self,
        action: ActionClass,
        origin: &CommunityId,
        destination: &CommunityId,
        moderator: &str,
        notices: &dyn NoticeSink,
    ) -> Result<Decision, EvaluationError> {
        if !self.has_capability(moderator, destination).await? {
            let place = if destination == origin {
                String::new()
            } else {
                format!(" in r/{destination}")
            };
            notices.notify(
                format!("You do not have permission to {}{place}!", action.verb()),
                Severity::Neutral,
            );
            return Ok(Decision::DeniedByPermission);
        }

        if destination == origin {
            return Ok(Decision::Permitted);
        }

        if !self.has_capability(&self.app_username, destination).await? {
            notices.notify(
                format!(
                    "u/{} is not a moderator of r/{destination} with access permissions",
                    self.app_username
                ),
                Severity::Neutral,
            );
            return Ok(Decision::DeniedByPermission);
        }

        let policy = self.policies.load(destination).await?;
        let list = policy.for_action(action);
        debug!(
            allow_list_enabled = list.allow_list_enabled,
            allow_list = ?list.allow_list,
            deny_list = ?list.deny_list,
            "Checking trust policy"
        );

        if list.permits(origin) {
            Ok(Decision::Permitted)
        } else {
            notices.notify(
                format!("r/{destination} does not accept {} from r/{origin}", action.noun()),
                Severity::Neutral,
            );
            Ok(Decision::DeniedByPolicy)
        }
    }

    /// Boolean form of [`evaluate`](Self::evaluate).
    ///
    /// Collaborator failures count as "not permitted" and are reported
    /// with a notice.
    pub async fn can_act(
        &self,
        action: ActionClass,
        origin: &CommunityId,
        destination: &CommunityId,
        moderator: &str,
        notices: &dyn NoticeSink,
    ) -> bool {
        match self
            .evaluate(action, origin, destination, moderator, notices)
            .await
        {
            Ok(decision) => decision == Decision::Permitted,
            Err(e) => {
                warn!(destination = %destination, error = %e, "Permission evaluation failed");
                notices.notify(
                    format!("Error while checking permissions in r/{destination}"),
                    Severity::Neutral,
                );
                false
            }
        }
    }
}
