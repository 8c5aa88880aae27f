//! Policy Model Types

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized community (subreddit) name.
///
/// Always lowercase, trimmed and without an `r/` prefix. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommunityId(String);

impl CommunityId {
    /// Normalize a raw community name.
    ///
    /// Returns `None` when nothing is left after normalization.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.to_lowercase();
        let mut name = lowered.trim();
        while let Some(rest) = strip_prefix_marker(name) {
            name = rest.trim();
        }

        if name.is_empty() {
            None
        } else {
            Some(Self(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn strip_prefix_marker(name: &str) -> Option<&str> {
    name.strip_prefix("/r/").or_else(|| name.strip_prefix("r/"))
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CommunityId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid community name: {value:?}"))
    }
}

impl From<CommunityId> for String {
    fn from(value: CommunityId) -> Self {
        value.0
    }
}

/// The two independently configured moderation action classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    Ban,
    Note,
}

impl ActionClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Note => "note",
        }
    }

    /// Verb phrase used in user-facing notices ("... permission to {verb}").
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Ban => "ban users",
            Self::Note => "add mod notes",
        }
    }

    /// Plural noun used in policy notices ("... does not accept {noun} from ...").
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Ban => "bans",
            Self::Note => "mod notes",
        }
    }
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allow/deny configuration for one action class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPolicy {
    pub allow_list_enabled: bool,
    pub allow_list: BTreeSet<CommunityId>,
    pub deny_list: BTreeSet<CommunityId>,
}

impl ListPolicy {
    /// Whether this policy lets `origin` act.
    ///
    /// Only one list is consulted: the allow list when it is enabled,
    /// the deny list otherwise.
    pub fn permits(&self, origin: &CommunityId) -> bool {
        if self.allow_list_enabled {
            self.allow_list.contains(origin)
        } else {
            !self.deny_list.contains(origin)
        }
    }
}

/// Installation defaults offered to moderators when they open the action form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityDefaults {
    /// Destinations pre-filled in the form.
    pub other_subreddits: BTreeSet<CommunityId>,
    /// Ban message template pre-filled in the form.
    pub default_user_message: String,
}

/// Trust policy owned by one community.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPolicy {
    pub ban: ListPolicy,
    pub note: ListPolicy,
    pub defaults: CommunityDefaults,
    pub last_updated: Option<DateTime<Utc>>,
}

impl CommunityPolicy {
    pub const fn for_action(&self, action: ActionClass) -> &ListPolicy {
        match action {
            ActionClass::Ban => &self.ban,
            ActionClass::Note => &self.note,
        }
    }

    /// Current value of a single field.
    pub fn value(&self, field: PolicyField) -> PolicyValue {
        match field {
            PolicyField::BanAllowList => PolicyValue::Communities(self.ban.allow_list.clone()),
            PolicyField::BanDenyList => PolicyValue::Communities(self.ban.deny_list.clone()),
            PolicyField::BanAllowListEnabled => PolicyValue::Flag(self.ban.allow_list_enabled),
            PolicyField::NoteAllowList => PolicyValue::Communities(self.note.allow_list.clone()),
            PolicyField::NoteDenyList => PolicyValue::Communities(self.note.deny_list.clone()),
            PolicyField::NoteAllowListEnabled => PolicyValue::Flag(self.note.allow_list_enabled),
            PolicyField::OtherSubreddits => {
                PolicyValue::Communities(self.defaults.other_subreddits.clone())
            }
            PolicyField::DefaultUserMessage => {
                PolicyValue::Text(self.defaults.default_user_message.clone())
            }
            PolicyField::LastUpdated => PolicyValue::Timestamp(self.last_updated),
        }
    }

    /// Overwrite a single field. Mismatched value kinds are ignored.
    pub fn apply(&mut self, field: PolicyField, value: PolicyValue) {
        match (field, value) {
            (PolicyField::BanAllowList, PolicyValue::Communities(v)) => self.ban.allow_list = v,
            (PolicyField::BanDenyList, PolicyValue::Communities(v)) => self.ban.deny_list = v,
            (PolicyField::BanAllowListEnabled, PolicyValue::Flag(v)) => {
                self.ban.allow_list_enabled = v;
            }
            (PolicyField::NoteAllowList, PolicyValue::Communities(v)) => self.note.allow_list = v,
            (PolicyField::NoteDenyList, PolicyValue::Communities(v)) => self.note.deny_list = v,
            (PolicyField::NoteAllowListEnabled, PolicyValue::Flag(v)) => {
                self.note.allow_list_enabled = v;
            }
            (PolicyField::OtherSubreddits, PolicyValue::Communities(v)) => {
                self.defaults.other_subreddits = v;
            }
            (PolicyField::DefaultUserMessage, PolicyValue::Text(v)) => {
                self.defaults.default_user_message = v;
            }
            (PolicyField::LastUpdated, PolicyValue::Timestamp(v)) => self.last_updated = v,
            _ => {}
        }
    }
}

/// A stored policy field.
///
/// The string keys are the field names persisted in the configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyField {
    BanAllowList,
    BanDenyList,
    BanAllowListEnabled,
    NoteAllowList,
    NoteDenyList,
    NoteAllowListEnabled,
    OtherSubreddits,
    DefaultUserMessage,
    LastUpdated,
}

impl PolicyField {
    pub const ALL: [Self; 9] = [
        Self::BanAllowList,
        Self::BanDenyList,
        Self::BanAllowListEnabled,
        Self::NoteAllowList,
        Self::NoteDenyList,
        Self::NoteAllowListEnabled,
        Self::OtherSubreddits,
        Self::DefaultUserMessage,
        Self::LastUpdated,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::BanAllowList => "subredditAllowList",
            Self::BanDenyList => "subredditDenyList",
            Self::BanAllowListEnabled => "enableAllowlist",
            Self::NoteAllowList => "noteAllowList",
            Self::NoteDenyList => "noteDenyList",
            Self::NoteAllowListEnabled => "enableNoteAllowList",
            Self::OtherSubreddits => "otherSubreddits",
            Self::DefaultUserMessage => "defaultUserMessage",
            Self::LastUpdated => "lastUpdated",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Human-readable label used in change descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::BanAllowList => "ban allow list",
            Self::BanDenyList => "ban deny list",
            Self::BanAllowListEnabled => "ban allow list enforcement",
            Self::NoteAllowList => "mod note allow list",
            Self::NoteDenyList => "mod note deny list",
            Self::NoteAllowListEnabled => "mod note allow list enforcement",
            Self::OtherSubreddits => "default subreddits",
            Self::DefaultUserMessage => "default user message",
            Self::LastUpdated => "last updated",
        }
    }
}

impl fmt::Display for PolicyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value of a single policy field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyValue {
    Flag(bool),
    Communities(BTreeSet<CommunityId>),
    Text(String),
    Timestamp(Option<DateTime<Utc>>),
}

/// Raw stored record: field key to JSON-encoded value.
pub type RawPolicyRecord = HashMap<String, String>;
