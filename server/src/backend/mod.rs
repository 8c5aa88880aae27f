//! Action Backend
//!
//! The platform collaborator that looks up moderators, resolves
//! communities and content, and performs bans and mod notes.

pub mod reddit;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::permissions::ModPermissions;
use crate::policy::CommunityId;
use crate::tokens::ContentItem;

pub use reddit::RedditBackend;

/// A community that exists and is visible to the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityRef {
    /// Fullname, e.g. `t5_2qh1i`.
    pub id: String,
    /// Normalized name.
    pub name: CommunityId,
    /// Name as the platform displays it.
    pub display_name: String,
}

/// Mod note labels accepted by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModNoteLabel {
    BotBan,
    PermaBan,
    #[default]
    Ban,
    AbuseWarning,
    SpamWarning,
    SpamWatch,
    SolidContributor,
    HelpfulUser,
}

impl ModNoteLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BotBan => "BOT_BAN",
            Self::PermaBan => "PERMA_BAN",
            Self::Ban => "BAN",
            Self::AbuseWarning => "ABUSE_WARNING",
            Self::SpamWarning => "SPAM_WARNING",
            Self::SpamWatch => "SPAM_WATCH",
            Self::SolidContributor => "SOLID_CONTRIBUTOR",
            Self::HelpfulUser => "HELPFUL_USER",
        }
    }
}

/// Arguments of a single ban.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanParams {
    pub community: CommunityRef,
    pub username: String,
    /// Ban length in days; `None` is permanent.
    pub duration_days: Option<u32>,
    /// Attribution shown in the community's ban list.
    pub reason: String,
    /// Moderator-only note.
    pub note: String,
    /// Message sent to the banned user.
    pub message: String,
    /// Fullname of the content that prompted the ban.
    pub context: Option<String>,
}

/// Arguments of a single mod note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModNoteParams {
    pub community: CommunityRef,
    pub username: String,
    pub label: ModNoteLabel,
    pub note: String,
    /// Fullname of the content the note refers to. Only valid in the
    /// community the content lives in.
    pub content_id: Option<String>,
}

/// Errors from the platform backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connection, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected HTTP status.
    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The platform accepted the request but reported errors.
    #[error("Platform rejected the request: {0}")]
    Api(String),

    /// Response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Platform operations consumed by the fan-out engine.
#[async_trait]
pub trait ActionBackend: Send + Sync {
    /// Moderator permissions `username` holds in `community`.
    /// Empty when the user is not a moderator there.
    async fn mod_permissions(
        &self,
        username: &str,
        community: &CommunityId,
    ) -> Result<ModPermissions, BackendError>;

    /// Resolve a community name. `None` when it is banned, private or missing.
    async fn resolve_community(
        &self,
        name: &CommunityId,
    ) -> Result<Option<CommunityRef>, BackendError>;

    /// Fetch a comment or post by fullname.
    async fn fetch_content(&self, id: &str) -> Result<Option<ContentItem>, BackendError>;

    async fn ban_user(&self, ban: &BanParams) -> Result<(), BackendError>;

    async fn add_mod_note(&self, note: &ModNoteParams) -> Result<(), BackendError>;
}
