//! BanHammer Server
//!
//! Cross-community ban and mod note engine. A moderator acting on a user
//! in one community can apply the same ban or note in every other
//! community that trusts it, each community deciding for itself which
//! origins it accepts.

pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod fanout;
pub mod notice;
pub mod permissions;
pub mod policy;
pub mod session;
pub mod tokens;
