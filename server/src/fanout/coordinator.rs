//! Fan-Out Coordinator
//!
//! Executes one validated request:
//! 1. Returns early when no action class is enabled.
//! 2. Checks the moderator's capability in the origin community.
//! 3. Resolves every distinct foreign destination once.
//! 4. Evaluates and executes each (action, destination) pair in its own task.
//! 5. Reduces the collected outcomes and emits one summary per action class.
//!
//! A failure in one destination never aborts the others.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use super::outcome::{summary, ActionOutcome, DestinationOutcome, FanOutReport};
use super::request::{ActionRequest, PlannedAction};
use crate::backend::{ActionBackend, BackendError, BanParams, CommunityRef, ModNoteParams};
use crate::notice::{NoticeSink, Severity};
use crate::permissions::{Decision, PermissionEvaluator};
use crate::policy::{ActionClass, CommunityId};
use crate::tokens::render;

/// Notice sent when neither action class is selected.
pub const NOTHING_TO_DO: &str = "Nothing to do: neither ban nor mod note was selected";

/// Whole-request failures. Everything else is reported per destination.
#[derive(Debug, Error)]
pub enum FanOutError {
    /// The moderator lacks capability in the origin community.
    #[error("Missing moderator permissions in r/{0}")]
    PermissionDenied(CommunityId),

    /// The origin capability lookup itself failed.
    #[error("Failed to check permissions in r/{community}: {source}")]
    CapabilityLookup {
        community: CommunityId,
        source: BackendError,
    },
}

/// Runs fan-out requests against the platform backend.
#[derive(Clone)]
pub struct FanOutCoordinator {
    backend: Arc<dyn ActionBackend>,
    evaluator: PermissionEvaluator,
}

impl FanOutCoordinator {
    pub fn new(backend: Arc<dyn ActionBackend>, evaluator: PermissionEvaluator) -> Self {
        Self { backend, evaluator }
    }

    pub const fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Execute `request`, reporting progress through `notices`.
    pub async fn execute(
        &self,
        request: ActionRequest,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<FanOutReport, FanOutError> {
        let span = tracing::info_span!(
            "fan_out",
            request_id = %Uuid::now_v7(),
            moderator = %request.moderator(),
            origin = %request.origin().name,
            target = %request.target_user(),
        );
        self.run(request, notices).instrument(span).await
    }

    async fn run(
        &self,
        request: ActionRequest,
        notices: Arc<dyn NoticeSink>,
    ) -> Result<FanOutReport, FanOutError> {
        if request.is_empty() {
            notices.notify(NOTHING_TO_DO.to_string(), Severity::Neutral);
            return Ok(FanOutReport::nothing_to_do());
        }

        let origin = request.origin().name.clone();
        let allowed = self
            .evaluator
            .has_capability(request.moderator(), &origin)
            .await
            .map_err(|source| FanOutError::CapabilityLookup {
                community: origin.clone(),
                source,
            })?;
        if !allowed {
            let verb = if request.ban().is_some() {
                ActionClass::Ban.verb()
            } else {
                ActionClass::Note.verb()
            };
            notices.notify(
                format!("You do not have permission to {verb} in this subreddit!"),
                Severity::Neutral,
            );
            return Err(FanOutError::PermissionDenied(origin));
        }

        let enabled: Vec<ActionClass> = request.enabled().iter().map(|(action, _)| *action).collect();
        let resolved = self.resolve_destinations(&request, &*notices).await;

        let request = Arc::new(request);
        let mut outcomes = Vec::new();
        let mut handles = Vec::new();

        for plan in request.actions() {
            let action = plan.class();
            for destination in plan.destinations() {
                match resolved.get(destination) {
                    Some(Ok(community)) => {
                        let coordinator = self.clone();
                        let request = Arc::clone(&request);
                        let plan = plan.clone();
                        let notices = Arc::clone(&notices);
                        let community = community.clone();
                        let handle = tokio::spawn(
                            async move {
                                coordinator
                                    .run_destination(&request, &plan, &community, &*notices)
                                    .await
                            }
                            .in_current_span(),
                        );
                        handles.push((action, destination.clone(), handle));
                    }
                    Some(Err(reason)) => outcomes.push(DestinationOutcome {
                        destination: destination.clone(),
                        action,
                        outcome: ActionOutcome::Skipped {
                            reason: reason.clone(),
                        },
                    }),
                    None => {}
                }
            }
        }

        let joined = join_all(handles.into_iter().map(|(action, destination, handle)| {
            let notices = Arc::clone(&notices);
            async move {
                let outcome = handle.await.unwrap_or_else(|e| {
                    error!(destination = %destination, action = %action, "Destination task panicked: {}", e);
                    notices.notify(
                        format!("Error while processing r/{destination}"),
                        Severity::Neutral,
                    );
                    ActionOutcome::Failed {
                        reason: format!("task failed: {e}"),
                    }
                });
                DestinationOutcome {
                    destination,
                    action,
                    outcome,
                }
            }
        }))
        .await;
        outcomes.extend(joined);

        let report = FanOutReport::from_outcomes(&enabled, outcomes);
        for action in &enabled {
            notices.notify(summary(*action, report.performed(*action)), Severity::Success);
        }

        info!(
            banned = ?report.banned,
            noted = ?report.noted,
            failures = report.failures.len(),
            "Fan-out finished"
        );
        Ok(report)
    }

    /// Resolve every distinct destination once. The origin is never looked up.
    async fn resolve_destinations(
        &self,
        request: &ActionRequest,
        notices: &dyn NoticeSink,
    ) -> HashMap<CommunityId, Result<CommunityRef, String>> {
        let origin = request.origin();
        let foreign: BTreeSet<&CommunityId> = request
            .enabled()
            .into_iter()
            .flat_map(|(_, destinations)| destinations.iter())
            .filter(|name| **name != origin.name)
            .collect();

        let lookups = join_all(foreign.into_iter().map(|name| async move {
            let result = match self.backend.resolve_community(name).await {
                Ok(Some(community)) => Ok(community),
                Ok(None) => {
                    notices.notify(
                        format!("Error fetching r/{name}. It could be banned, private, or non-existent."),
                        Severity::Neutral,
                    );
                    Err("not found".to_string())
                }
                Err(e) => {
                    warn!(destination = %name, error = %e, "Failed to resolve community");
                    notices.notify(format!("Error fetching r/{name}"), Severity::Neutral);
                    Err(e.to_string())
                }
            };
            (name.clone(), result)
        }))
        .await;

        let mut resolved: HashMap<_, _> = lookups.into_iter().collect();
        resolved.insert(origin.name.clone(), Ok(origin.clone()));
        resolved
    }

    /// Evaluate and perform one action in one resolved destination.
    async fn run_destination(
        &self,
        request: &ActionRequest,
        plan: &PlannedAction,
        community: &CommunityRef,
        notices: &dyn NoticeSink,
    ) -> ActionOutcome {
        let action = plan.class();
        let origin = &request.origin().name;
        // Origin capability was checked before fan-out.
        let decision = if community.name == *origin {
            Ok(Decision::Permitted)
        } else {
            self.evaluator
                .evaluate(action, origin, &community.name, request.moderator(), notices)
                .await
        };

        match decision {
            Ok(Decision::Permitted) => match self.perform(request, plan, community).await {
                Ok(()) => ActionOutcome::Performed,
                Err(e) => {
                    error!(destination = %community.name, action = %action, error = %e, "Action failed");
                    let what = match action {
                        ActionClass::Ban => "banning user",
                        ActionClass::Note => "adding mod note",
                    };
                    notices.notify(
                        format!("Error while {what} in r/{}", community.display_name),
                        Severity::Neutral,
                    );
                    ActionOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            },
            Ok(Decision::DeniedByPermission) => ActionOutcome::DeniedByPermission,
            Ok(Decision::DeniedByPolicy) => ActionOutcome::DeniedByPolicy,
            Err(e) => {
                error!(destination = %community.name, action = %action, error = %e, "Permission evaluation failed");
                notices.notify(
                    format!("Error while checking permissions in r/{}", community.display_name),
                    Severity::Neutral,
                );
                ActionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn perform(
        &self,
        request: &ActionRequest,
        plan: &PlannedAction,
        community: &CommunityRef,
    ) -> Result<(), BackendError> {
        let item = request.item();
        let origin = request.origin();
        let in_origin = community.name == origin.name;

        match plan {
            PlannedAction::Ban(ban) => {
                let params = BanParams {
                    community: community.clone(),
                    username: request.target_user().to_string(),
                    duration_days: ban.duration_days,
                    reason: format!(
                        "Mass ban by u/{} from r/{} utilizing BanHammer.",
                        request.moderator(),
                        origin.display_name
                    ),
                    note: ban.note.clone(),
                    message: render(&ban.message_template, item, &community.display_name),
                    context: in_origin.then(|| item.id().to_string()),
                };
                self.backend.ban_user(&params).await
            }
            PlannedAction::Note(note) => {
                let mut text = render(&note.note_template, item, &community.display_name);
                if !in_origin {
                    text = format!("{text} ({})", item.url());
                }
                let params = ModNoteParams {
                    community: community.clone(),
                    username: request.target_user().to_string(),
                    label: note.label,
                    note: text,
                    content_id: in_origin.then(|| item.id().to_string()),
                };
                self.backend.add_mod_note(&params).await
            }
        }
    }
}
