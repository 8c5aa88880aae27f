//! Community Settings API
//!
//! Read and partially update a community's trust policy and defaults.

use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::moderator::Moderator;
use super::{community_from_path, require_permissions, AppState};
use crate::notice::{notice_channel, Notice, NoticeSink, Severity};
use crate::permissions::ModPermissions;
use crate::policy::{
    normalize, normalize_entries, ChangeDescription, CommunityId, CommunityPolicy, PolicyField,
    PolicyPatch, PolicyValue,
};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Community list as typed into a text area or sent as an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Lines(String),
    Entries(Vec<String>),
}

impl ListInput {
    fn normalized(self) -> BTreeSet<CommunityId> {
        match self {
            Self::Lines(raw) => normalize(&raw),
            Self::Entries(entries) => normalize_entries(entries),
        }
    }
}

/// Partial settings update. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsUpdate {
    pub ban_allow_list_enabled: Option<bool>,
    pub ban_allow_list: Option<ListInput>,
    pub ban_deny_list: Option<ListInput>,
    pub note_allow_list_enabled: Option<bool>,
    pub note_allow_list: Option<ListInput>,
    pub note_deny_list: Option<ListInput>,
    pub other_subreddits: Option<ListInput>,
    pub default_user_message: Option<String>,
}

impl SettingsUpdate {
    /// Convert to a patch, normalizing every list.
    pub fn into_patch(self) -> PolicyPatch {
        let flags = [
            (PolicyField::BanAllowListEnabled, self.ban_allow_list_enabled),
            (PolicyField::NoteAllowListEnabled, self.note_allow_list_enabled),
        ];
        let lists = [
            (PolicyField::BanAllowList, self.ban_allow_list),
            (PolicyField::BanDenyList, self.ban_deny_list),
            (PolicyField::NoteAllowList, self.note_allow_list),
            (PolicyField::NoteDenyList, self.note_deny_list),
            (PolicyField::OtherSubreddits, self.other_subreddits),
        ];

        let mut patch = PolicyPatch::new();
        for (field, flag) in flags.into_iter().filter_map(|(f, v)| Some((f, v?))) {
            patch = patch.with(field, PolicyValue::Flag(flag));
        }
        for (field, list) in lists.into_iter().filter_map(|(f, v)| Some((f, v?))) {
            patch = patch.with(field, PolicyValue::Communities(list.normalized()));
        }
        if let Some(message) = self.default_user_message {
            patch = patch.with(PolicyField::DefaultUserMessage, PolicyValue::Text(message));
        }
        patch
    }
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub community: CommunityId,
    pub settings: CommunityPolicy,
}

#[derive(Debug, Serialize)]
pub struct SettingsUpdateResponse {
    pub community: CommunityId,
    pub changes: Vec<ChangeDescription>,
    pub notices: Vec<Notice>,
    pub settings: CommunityPolicy,
}

// ============================================================================
// Handlers
// ============================================================================

/// Current policy and defaults of a community.
///
/// GET /api/communities/{community}/settings
#[tracing::instrument(skip(state), fields(moderator = %moderator.0))]
pub async fn get_settings(
    State(state): State<AppState>,
    moderator: Moderator,
    Path(community): Path<String>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let community = community_from_path(&community)?;
    require_permissions(&state, &moderator, &community, ModPermissions::can_moderate).await?;

    let settings = state.policies.load(&community).await?;
    Ok(Json(SettingsResponse {
        community,
        settings,
    }))
}

/// Partially update a community's settings.
///
/// PATCH /api/communities/{community}/settings
#[tracing::instrument(skip(state, update), fields(moderator = %moderator.0))]
pub async fn update_settings(
    State(state): State<AppState>,
    moderator: Moderator,
    Path(community): Path<String>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsUpdateResponse>, ApiError> {
    let community = community_from_path(&community)?;
    require_permissions(&state, &moderator, &community, ModPermissions::can_configure).await?;

    let patch = update.into_patch();
    let changes = if patch.is_empty() {
        Vec::new()
    } else {
        state.policies.update(&community, &patch).await?
    };

    let (sink, mut receiver) = notice_channel();
    for change in &changes {
        sink.notify(change.summary.clone(), Severity::Success);
    }

    let settings = state.policies.load(&community).await?;
    Ok(Json(SettingsUpdateResponse {
        community,
        changes,
        notices: receiver.drain(),
        settings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accepts_lines_and_arrays() {
        let update: SettingsUpdate = serde_json::from_value(serde_json::json!({
            "ban_deny_list": "r/Spam\n\nSPAM\n eggs ",
            "note_allow_list": ["/r/Friends", ""],
            "ban_allow_list_enabled": true,
        }))
        .unwrap();

        let patch = update.into_patch();
        let fields: Vec<PolicyField> = patch.iter().map(|(field, _)| field).collect();
        assert_eq!(fields.len(), 3);

        let deny = patch
            .iter()
            .find(|(field, _)| *field == PolicyField::BanDenyList)
            .map(|(_, value)| value.clone());
        let expected = PolicyValue::Communities(normalize("spam\neggs"));
        assert_eq!(deny, Some(expected));
    }

    #[test]
    fn test_empty_update_is_empty_patch() {
        assert!(SettingsUpdate::default().into_patch().is_empty());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<SettingsUpdate, _> =
            serde_json::from_value(serde_json::json!({ "nope": true }));
        assert!(result.is_err());
    }
}
