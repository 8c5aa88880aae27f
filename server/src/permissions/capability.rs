//! Moderator Permission Flags
//!
//! Moderator permission scopes as reported by the platform for one
//! moderator in one community.

use bitflags::bitflags;

bitflags! {
    /// Moderator permissions held in a community.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    pub struct ModPermissions: u32 {
        /// Full permissions
        const ALL           = 1 << 0;
        /// Manage the approved users and ban lists
        const ACCESS        = 1 << 1;
        /// Manage settings, rules, widgets and installed apps
        const CONFIG        = 1 << 2;
        /// Manage user and post flair
        const FLAIR         = 1 << 3;
        /// Read and reply to modmail
        const MAIL          = 1 << 4;
        /// Approve, remove and lock content
        const POSTS         = 1 << 5;
        /// Manage wiki pages
        const WIKI          = 1 << 6;
        /// Manage chat settings
        const CHAT_CONFIG   = 1 << 7;
        /// Moderate chat rooms
        const CHAT_OPERATOR = 1 << 8;
    }
}

impl ModPermissions {
    /// Scopes that allow banning users and adding mod notes.
    pub const MODERATE: Self = Self::ALL.union(Self::ACCESS);

    /// Scopes that allow changing the community's app settings.
    pub const CONFIGURE: Self = Self::ALL.union(Self::CONFIG);

    /// Parse the platform's permission names (`"all"`, `"access"`, ...).
    ///
    /// Unknown names are ignored.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| Self::from_permission_name(name.as_ref()))
            .fold(Self::empty(), |acc, flag| acc | flag)
    }

    fn from_permission_name(name: &str) -> Option<Self> {
        Some(match name {
            "all" => Self::ALL,
            "access" => Self::ACCESS,
            "config" => Self::CONFIG,
            "flair" => Self::FLAIR,
            "mail" => Self::MAIL,
            "posts" => Self::POSTS,
            "wiki" => Self::WIKI,
            "chat_config" => Self::CHAT_CONFIG,
            "chat_operator" => Self::CHAT_OPERATOR,
            _ => return None,
        })
    }

    /// Whether these permissions allow bans and mod notes.
    #[must_use]
    pub const fn can_moderate(self) -> bool {
        self.intersects(Self::MODERATE)
    }

    /// Whether these permissions allow editing app settings.
    #[must_use]
    pub const fn can_configure(self) -> bool {
        self.intersects(Self::CONFIGURE)
    }
}

impl Default for ModPermissions {
    fn default() -> Self {
        Self::empty()
    }
}
