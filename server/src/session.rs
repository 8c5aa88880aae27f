//! Action Sessions
//!
//! Short-lived record of the content a moderator opened the action form
//! on, created when the form is shown and consumed when it is submitted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::StoreError;
use crate::tokens::ContentItem;

/// Where the action form was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentLocation {
    Comment,
    Post,
}

impl ContentLocation {
    /// Whether `item` is the kind of content this location refers to.
    pub const fn matches(self, item: &ContentItem) -> bool {
        matches!(
            (self, item),
            (Self::Comment, ContentItem::Comment { .. }) | (Self::Post, ContentItem::Post { .. })
        )
    }
}

/// Context captured when the moderator opened the action form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
    /// Fullname of the comment or post.
    pub target_id: String,
    pub location: ContentLocation,
}

/// Session store collaborator. Implementations own expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, key: &str, context: &ActionContext) -> Result<(), StoreError>;

    /// Remove and return the session. `None` if absent or expired.
    async fn consume(&self, key: &str) -> Result<Option<ActionContext>, StoreError>;
}

/// Session key for a moderator.
pub fn session_key(prefix: &str, moderator: &str) -> String {
    format!("{prefix}:{}", moderator.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_is_case_insensitive() {
        assert_eq!(session_key("bh:session", "SomeMod"), "bh:session:somemod");
    }

    #[test]
    fn test_location_matches_content_kind() {
        let post = ContentItem::Post {
            id: "t3_abc".into(),
            author_name: "someone".into(),
            subreddit_name: "Origin".into(),
        };
        assert!(ContentLocation::Post.matches(&post));
        assert!(!ContentLocation::Comment.matches(&post));
    }

    #[test]
    fn test_context_wire_format() {
        let context = ActionContext {
            target_id: "t1_abc".into(),
            location: ContentLocation::Comment,
        };
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["location"], "comment");
        assert_eq!(json["target_id"], "t1_abc");
    }
}
