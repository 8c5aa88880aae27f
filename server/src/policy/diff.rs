//! Settings change descriptions.
//!
//! Pure comparison of an old and a new field value, producing the
//! human-readable line shown to moderators after a settings update.

use std::collections::BTreeSet;

use serde::Serialize;

use super::types::{CommunityId, PolicyField, PolicyValue};

/// A human-readable description of one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDescription {
    pub field: &'static str,
    pub summary: String,
}

/// Describe how `field` changed from `old` to `new`.
///
/// Returns `None` when the value is unchanged.
pub fn diff(field: PolicyField, old: &PolicyValue, new: &PolicyValue) -> Option<ChangeDescription> {
    if old == new {
        return None;
    }

    let summary = match (old, new) {
        (_, PolicyValue::Flag(enabled)) => {
            let verb = if *enabled { "Enabled" } else { "Disabled" };
            format!("{verb} {}", field.label())
        }
        (PolicyValue::Communities(before), PolicyValue::Communities(after)) => {
            describe_list_change(field, before, after)
        }
        (_, PolicyValue::Communities(after)) => {
            describe_list_change(field, &BTreeSet::new(), after)
        }
        (_, PolicyValue::Text(text)) if text.is_empty() => format!("Cleared {}", field.label()),
        (_, PolicyValue::Text(_)) => format!("Updated {}", field.label()),
        (_, PolicyValue::Timestamp(_)) => format!("Updated {}", field.label()),
    };

    Some(ChangeDescription {
        field: field.key(),
        summary,
    })
}

fn describe_list_change(
    field: PolicyField,
    before: &BTreeSet<CommunityId>,
    after: &BTreeSet<CommunityId>,
) -> String {
    let added: Vec<String> = after.difference(before).map(|c| format!("r/{c}")).collect();
    let removed: Vec<String> = before.difference(after).map(|c| format!("r/{c}")).collect();

    let mut parts = Vec::with_capacity(2);
    if !added.is_empty() {
        parts.push(format!("added {}", added.join(", ")));
    }
    if !removed.is_empty() {
        parts.push(format!("removed {}", removed.join(", ")));
    }

    let label = field.label();
    let mut chars = label.chars();
    let capitalized = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect::<String>())
        .unwrap_or_default();

    format!("{capitalized}: {}", parts.join("; "))
}
