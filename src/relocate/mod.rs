//! Moving player records out of reset dimensions

pub mod batch;
pub mod player;

pub use batch::{BatchResult, BatchRunner, FailureKind, FileFailure, FileOutcome, run_batch};
pub use player::{Decision, PlayerRecord, decide, is_eligible, relocate};
