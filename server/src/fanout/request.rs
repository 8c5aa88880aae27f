//! Action form and validated fan-out request.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{CommunityRef, ModNoteLabel};
use crate::policy::{normalize, ActionClass, CommunityId};
use crate::tokens::ContentItem;

/// Longest temporary ban the platform accepts, in days.
pub const MAX_BAN_DAYS: i64 = 999;

/// Values submitted from the action form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionForm {
    pub ban_user: bool,
    /// Ban length in days; `0` bans permanently.
    pub duration: i64,
    /// Moderator-only ban note.
    pub reason: String,
    /// Ban message template.
    pub user_message: String,
    /// Additional ban destinations, one per line.
    pub ban_subreddits: String,
    pub add_note: bool,
    pub note_label: ModNoteLabel,
    /// Mod note template.
    pub note: String,
    /// Additional mod note destinations, one per line.
    pub note_subreddits: String,
}

/// The form was rejected before any side effect.
///
/// Carries the submitted values so the form can be shown again with
/// the moderator's input intact.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{message}")]
pub struct ValidationFailed {
    pub field: &'static str,
    pub message: String,
    pub input: ActionForm,
}

impl ActionForm {
    /// Reject forms that can not be executed.
    pub fn validate(&self) -> Result<(), ValidationFailed> {
        if self.add_note && self.note.trim().is_empty() {
            return Err(self.reject("note", "Mod note text is required"));
        }
        if self.ban_user && !(0..=MAX_BAN_DAYS).contains(&self.duration) {
            return Err(self.reject(
                "duration",
                format!("Duration must be between 0 and {MAX_BAN_DAYS} days"),
            ));
        }
        Ok(())
    }

    /// Neither a ban nor a mod note was selected.
    pub const fn selects_nothing(&self) -> bool {
        !self.ban_user && !self.add_note
    }

    fn reject(&self, field: &'static str, message: impl Into<String>) -> ValidationFailed {
        ValidationFailed {
            field,
            message: message.into(),
            input: self.clone(),
        }
    }
}

/// Ban half of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanPayload {
    pub duration_days: Option<u32>,
    pub note: String,
    pub message_template: String,
    /// Destinations including the origin.
    pub destinations: BTreeSet<CommunityId>,
}

/// Mod note half of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotePayload {
    pub label: ModNoteLabel,
    pub note_template: String,
    /// Destinations including the origin.
    pub destinations: BTreeSet<CommunityId>,
}

/// One enabled half of a request, shared with its per-destination tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Ban(Arc<BanPayload>),
    Note(Arc<NotePayload>),
}

impl PlannedAction {
    pub const fn class(&self) -> ActionClass {
        match self {
            Self::Ban(_) => ActionClass::Ban,
            Self::Note(_) => ActionClass::Note,
        }
    }

    /// Destinations including the origin.
    pub fn destinations(&self) -> &BTreeSet<CommunityId> {
        match self {
            Self::Ban(ban) => &ban.destinations,
            Self::Note(note) => &note.destinations,
        }
    }
}

/// A validated request to fan out bans and mod notes.
///
/// Only constructed through [`ActionRequest::from_form`], so an enabled
/// mod note always carries non-empty text.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    moderator: String,
    origin: CommunityRef,
    item: ContentItem,
    ban: Option<Arc<BanPayload>>,
    note: Option<Arc<NotePayload>>,
}

impl ActionRequest {
    /// Validate `form` and build the request. Destination lists are
    /// normalized and always include the origin.
    pub fn from_form(
        form: ActionForm,
        moderator: impl Into<String>,
        origin: CommunityRef,
        item: ContentItem,
    ) -> Result<Self, ValidationFailed> {
        form.validate()?;

        let destinations = |raw: &str| {
            let mut set = normalize(raw);
            set.insert(origin.name.clone());
            set
        };

        let ban = form.ban_user.then(|| {
            Arc::new(BanPayload {
                duration_days: duration_days(form.duration),
                note: form.reason.clone(),
                message_template: form.user_message.clone(),
                destinations: destinations(&form.ban_subreddits),
            })
        });
        let note = form.add_note.then(|| {
            Arc::new(NotePayload {
                label: form.note_label,
                note_template: form.note.clone(),
                destinations: destinations(&form.note_subreddits),
            })
        });

        Ok(Self {
            moderator: moderator.into(),
            origin,
            item,
            ban,
            note,
        })
    }

    pub fn moderator(&self) -> &str {
        &self.moderator
    }

    pub const fn origin(&self) -> &CommunityRef {
        &self.origin
    }

    pub const fn item(&self) -> &ContentItem {
        &self.item
    }

    /// Author of the content, the user being acted on.
    pub fn target_user(&self) -> &str {
        self.item.author_name()
    }

    pub fn ban(&self) -> Option<&BanPayload> {
        self.ban.as_deref()
    }

    pub fn note(&self) -> Option<&NotePayload> {
        self.note.as_deref()
    }

    /// Enabled halves with their payloads, bans first.
    pub fn actions(&self) -> Vec<PlannedAction> {
        let ban = self.ban.iter().cloned().map(PlannedAction::Ban);
        let note = self.note.iter().cloned().map(PlannedAction::Note);
        ban.chain(note).collect()
    }

    /// Enabled action classes with their destinations, bans first.
    pub fn enabled(&self) -> Vec<(ActionClass, &BTreeSet<CommunityId>)> {
        let mut enabled = Vec::with_capacity(2);
        if let Some(ban) = &self.ban {
            enabled.push((ActionClass::Ban, &ban.destinations));
        }
        if let Some(note) = &self.note {
            enabled.push((ActionClass::Note, &note.destinations));
        }
        enabled
    }

    pub const fn is_empty(&self) -> bool {
        self.ban.is_none() && self.note.is_none()
    }
}

fn duration_days(duration: i64) -> Option<u32> {
    if duration <= 0 {
        None
    } else {
        Some(u32::try_from(duration).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> CommunityRef {
        CommunityRef {
            id: "t5_origin".into(),
            name: CommunityId::parse("origin").unwrap(),
            display_name: "Origin".into(),
        }
    }

    fn item() -> ContentItem {
        ContentItem::Post {
            id: "t3_abc".into(),
            author_name: "spammer".into(),
            subreddit_name: "Origin".into(),
        }
    }

    #[test]
    fn test_note_requires_text() {
        let form = ActionForm {
            add_note: true,
            note: "   ".into(),
            note_subreddits: "a\nb".into(),
            ..Default::default()
        };

        let err = form.validate().unwrap_err();
        assert_eq!(err.field, "note");
        assert_eq!(err.input, form);
    }

    #[test]
    fn test_selects_nothing() {
        assert!(ActionForm::default().selects_nothing());
        let form = ActionForm {
            add_note: true,
            ..Default::default()
        };
        assert!(!form.selects_nothing());
    }

    #[test]
    fn test_ban_only_form_is_valid_without_note() {
        let form = ActionForm {
            ban_user: true,
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_duration_out_of_range() {
        let form = ActionForm {
            ban_user: true,
            duration: 1000,
            ..Default::default()
        };
        assert_eq!(form.validate().unwrap_err().field, "duration");
    }

    #[test]
    fn test_destinations_are_normalized_and_include_origin() {
        let form = ActionForm {
            ban_user: true,
            ban_subreddits: "r/Alpha\n\n  beta \nORIGIN".into(),
            ..Default::default()
        };
        let request = ActionRequest::from_form(form, "mod", origin(), item()).unwrap();

        let ban = request.ban().unwrap();
        let names: Vec<_> = ban.destinations.iter().map(CommunityId::as_str).collect();
        assert_eq!(names, ["alpha", "beta", "origin"]);
        assert!(request.note().is_none());
        assert_eq!(request.target_user(), "spammer");
    }

    #[test]
    fn test_actions_carry_their_payloads() {
        let form = ActionForm {
            ban_user: true,
            ban_subreddits: "alpha".into(),
            add_note: true,
            note: "ring".into(),
            note_subreddits: "beta".into(),
            ..Default::default()
        };
        let request = ActionRequest::from_form(form, "mod", origin(), item()).unwrap();

        let actions = request.actions();
        let classes: Vec<_> = actions.iter().map(PlannedAction::class).collect();
        assert_eq!(classes, [ActionClass::Ban, ActionClass::Note]);

        match &actions[1] {
            PlannedAction::Note(note) => assert_eq!(note.note_template, "ring"),
            PlannedAction::Ban(_) => panic!("expected the note second"),
        }
        let notes: Vec<_> = actions[1].destinations().iter().map(CommunityId::as_str).collect();
        assert_eq!(notes, ["beta", "origin"]);
    }

    #[test]
    fn test_zero_duration_is_permanent() {
        assert_eq!(duration_days(0), None);
        assert_eq!(duration_days(-3), None);
        assert_eq!(duration_days(7), Some(7));
    }

    #[test]
    fn test_empty_request() {
        let request =
            ActionRequest::from_form(ActionForm::default(), "mod", origin(), item()).unwrap();
        assert!(request.is_empty());
        assert!(request.enabled().is_empty());
        assert!(request.actions().is_empty());
    }
}
