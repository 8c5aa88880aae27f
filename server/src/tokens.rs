//! Token Substitution
//!
//! Renders ban messages and mod notes by replacing placeholders with
//! values taken from the content the moderator acted on.
//!
//! Supported placeholders:
//! - `{{author}}`: author of the content
//! - `{{kind}}`: `comment` or `post`
//! - `{{originSubreddit}}`: community the content was posted in
//! - `{{subreddit}}`: community the action is applied in
//! - `{{url}}`: link back to the content

use serde::{Deserialize, Serialize};

/// Content a moderation action was invoked on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    Comment {
        /// Fullname, e.g. `t1_abc123`.
        id: String,
        author_name: String,
        subreddit_name: String,
        /// Fullname of the parent comment or post.
        parent_id: String,
        /// Fullname of the post the comment belongs to.
        post_id: String,
    },
    Post {
        /// Fullname, e.g. `t3_xyz789`.
        id: String,
        author_name: String,
        subreddit_name: String,
    },
}

impl ContentItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Comment { id, .. } | Self::Post { id, .. } => id,
        }
    }

    pub fn author_name(&self) -> &str {
        match self {
            Self::Comment { author_name, .. } | Self::Post { author_name, .. } => author_name,
        }
    }

    pub fn subreddit_name(&self) -> &str {
        match self {
            Self::Comment { subreddit_name, .. } | Self::Post { subreddit_name, .. } => {
                subreddit_name
            }
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Comment { .. } => "comment",
            Self::Post { .. } => "post",
        }
    }

    /// Permalink to the content.
    ///
    /// Posts use the short `redd.it` form. Comments link through their post,
    /// scoped under the community they were posted in.
    pub fn url(&self) -> String {
        match self {
            Self::Post { id, .. } => format!("https://redd.it/{}", thing_suffix(id)),
            Self::Comment {
                id,
                subreddit_name,
                post_id,
                ..
            } => format!(
                "https://www.reddit.com/r/{subreddit_name}/comments/{}/_/{}",
                thing_suffix(post_id),
                thing_suffix(id)
            ),
        }
    }
}

/// Strip the `tN_` type prefix from a fullname.
pub fn thing_suffix(fullname: &str) -> &str {
    fullname
        .split_once('_')
        .map_or(fullname, |(_, suffix)| suffix)
}

/// Render `template` for an action applied in `destination`.
///
/// Every occurrence of a known placeholder is replaced; anything else,
/// including unknown `{{...}}` tokens, is left as written.
pub fn render(template: &str, item: &ContentItem, destination: &str) -> String {
    template
        .replace("{{author}}", item.author_name())
        .replace("{{kind}}", item.kind())
        .replace("{{originSubreddit}}", item.subreddit_name())
        .replace("{{subreddit}}", destination)
        .replace("{{url}}", &item.url())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> ContentItem {
        ContentItem::Post {
            id: "t3_abc123".into(),
            author_name: "alice".into(),
            subreddit_name: "origin".into(),
        }
    }

    fn comment() -> ContentItem {
        ContentItem::Comment {
            id: "t1_def456".into(),
            author_name: "bob".into(),
            subreddit_name: "Origin".into(),
            parent_id: "t1_parent9".into(),
            post_id: "t3_abc123".into(),
        }
    }

    #[test]
    fn test_render_known_tokens() {
        assert_eq!(render("{{author}} in {{subreddit}}", &post(), "test"), "alice in test");
        assert_eq!(
            render("Your {{kind}} in r/{{originSubreddit}}: {{url}}", &post(), "elsewhere"),
            "Your post in r/origin: https://redd.it/abc123"
        );
    }

    #[test]
    fn test_render_leaves_unknown_tokens() {
        assert_eq!(render("{{foo}} {{author}}", &post(), "test"), "{{foo}} alice");
        assert_eq!(render("no tokens here", &post(), "test"), "no tokens here");
    }

    #[test]
    fn test_render_replaces_every_occurrence() {
        assert_eq!(
            render("{{author}}/{{author}}", &comment(), "test"),
            "bob/bob"
        );
    }

    #[test]
    fn test_post_url() {
        assert_eq!(post().url(), "https://redd.it/abc123");
    }

    #[test]
    fn test_comment_url_uses_post() {
        assert_eq!(
            comment().url(),
            "https://www.reddit.com/r/Origin/comments/abc123/_/def456"
        );
        assert_eq!(comment().kind(), "comment");
    }

    #[test]
    fn test_thing_suffix() {
        assert_eq!(thing_suffix("t3_abc"), "abc");
        assert_eq!(thing_suffix("abc"), "abc");
    }

    #[test]
    fn test_content_item_serde_tag() {
        let json = serde_json::to_value(post()).unwrap();
        assert_eq!(json["kind"], "post");
        let parsed: ContentItem = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, post());
    }
}
