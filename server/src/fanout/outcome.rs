//! Per-destination outcomes and the aggregated report.

use serde::Serialize;

use crate::policy::{ActionClass, CommunityId};

/// What happened in one destination for one action class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Performed,
    DeniedByPermission,
    DeniedByPolicy,
    /// Destination could not be resolved.
    Skipped { reason: String },
    /// A collaborator failed.
    Failed { reason: String },
}

impl ActionOutcome {
    pub const fn is_performed(&self) -> bool {
        matches!(self, Self::Performed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationOutcome {
    pub destination: CommunityId,
    pub action: ActionClass,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

/// A destination whose action failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub destination: CommunityId,
    pub action: ActionClass,
    pub reason: String,
}

/// Result of one fan-out.
///
/// Counts are `None` for action classes that were not requested, so a
/// report with both counts `None` means there was nothing to do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub banned: Option<usize>,
    pub noted: Option<usize>,
    pub failures: Vec<Failure>,
    pub outcomes: Vec<DestinationOutcome>,
}

impl FanOutReport {
    /// Report for a request with no action class enabled.
    pub fn nothing_to_do() -> Self {
        Self::default()
    }

    pub const fn is_nothing_to_do(&self) -> bool {
        self.banned.is_none() && self.noted.is_none()
    }

    /// Reduce collected outcomes. `enabled` lists the requested classes.
    pub fn from_outcomes(enabled: &[ActionClass], mut outcomes: Vec<DestinationOutcome>) -> Self {
        outcomes.sort_by(|a, b| (a.action, &a.destination).cmp(&(b.action, &b.destination)));

        let count = |class: ActionClass| {
            enabled.contains(&class).then(|| {
                outcomes
                    .iter()
                    .filter(|o| o.action == class && o.outcome.is_performed())
                    .count()
            })
        };

        let failures = outcomes
            .iter()
            .filter_map(|o| match &o.outcome {
                ActionOutcome::Failed { reason } => Some(Failure {
                    destination: o.destination.clone(),
                    action: o.action,
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect();

        Self {
            banned: count(ActionClass::Ban),
            noted: count(ActionClass::Note),
            failures,
            outcomes,
        }
    }

    /// Number of destinations where `action` was performed.
    pub fn performed(&self, action: ActionClass) -> usize {
        match action {
            ActionClass::Ban => self.banned.unwrap_or(0),
            ActionClass::Note => self.noted.unwrap_or(0),
        }
    }
}

/// Summary line for one action class.
pub fn summary(action: ActionClass, count: usize) -> String {
    let unit = if count == 1 { "subreddit" } else { "subreddits" };
    match action {
        ActionClass::Ban => format!("Banned from {count} {unit}"),
        ActionClass::Note => format!("Added mod note in {count} {unit}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, action: ActionClass, outcome: ActionOutcome) -> DestinationOutcome {
        DestinationOutcome {
            destination: CommunityId::parse(name).unwrap(),
            action,
            outcome,
        }
    }

    #[test]
    fn test_reduce_counts_and_failures() {
        let report = FanOutReport::from_outcomes(
            &[ActionClass::Ban],
            vec![
                outcome("c", ActionClass::Ban, ActionOutcome::Performed),
                outcome(
                    "b",
                    ActionClass::Ban,
                    ActionOutcome::Failed {
                        reason: "boom".into(),
                    },
                ),
                outcome("a", ActionClass::Ban, ActionOutcome::Performed),
                outcome("d", ActionClass::Ban, ActionOutcome::DeniedByPolicy),
            ],
        );

        assert_eq!(report.banned, Some(2));
        assert_eq!(report.noted, None);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].destination.as_str(), "b");
        assert_eq!(report.outcomes[0].destination.as_str(), "a");
    }

    #[test]
    fn test_nothing_to_do() {
        assert!(FanOutReport::nothing_to_do().is_nothing_to_do());
        let report = FanOutReport::from_outcomes(&[ActionClass::Note], Vec::new());
        assert_eq!(report.noted, Some(0));
        assert!(!report.is_nothing_to_do());
    }

    #[test]
    fn test_summary_wording() {
        assert_eq!(summary(ActionClass::Ban, 3), "Banned from 3 subreddits");
        assert_eq!(summary(ActionClass::Note, 1), "Added mod note in 1 subreddit");
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let json = serde_json::to_value(outcome(
            "a",
            ActionClass::Note,
            ActionOutcome::Skipped {
                reason: "not found".into(),
            },
        ))
        .unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["action"], "note");
        assert_eq!(json["reason"], "not found");
    }
}
