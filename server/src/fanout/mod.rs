//! Cross-Community Fan-Out
//!
//! Turns one moderator action into bans and mod notes across every
//! requested community that accepts it.

mod coordinator;
mod outcome;
mod request;

pub use coordinator::{FanOutCoordinator, FanOutError, NOTHING_TO_DO};
pub use outcome::{summary, ActionOutcome, DestinationOutcome, Failure, FanOutReport};
pub use request::{
    ActionForm, ActionRequest, BanPayload, NotePayload, PlannedAction, ValidationFailed,
    MAX_BAN_DAYS,
};
