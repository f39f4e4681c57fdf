//! Idempotent up/down vote toggling for topics and comments.

mod ledger;
mod models;
mod store;

pub use ledger::VoteLedger;
pub use models::{VoteOutcome, VoteTransition};
pub use store::{is_unique_violation, VoteStore};
