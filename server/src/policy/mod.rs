//! Policy Model
//!
//! Per-community trust policy for cross-community moderation. Each
//! community independently decides which other communities may ban users
//! or add mod notes in it, with a separate allow/deny pair per action class.

pub mod diff;
pub mod normalize;
pub mod store;
pub mod types;

pub use diff::{diff, ChangeDescription};
pub use normalize::{normalize, normalize_entries, to_lines};
pub use store::{policy_from_record, ConfigStore, PolicyPatch, PolicyService};
pub use types::*;
