//! Permission Evaluator
//!
//! Two independent gates decide whether an action may fan out into a
//! destination community:
//! - Capability: the invoking moderator (and, cross-community, the app
//!   account) must hold `all` or `access` moderator permissions there
//! - Policy: the destination's allow/deny list must accept the origin

pub mod capability;
pub mod evaluator;

pub use capability::ModPermissions;
pub use evaluator::{Decision, PermissionEvaluator};
