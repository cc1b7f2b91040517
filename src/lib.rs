// ============================================================================
// Player Data Relocator Library
// ============================================================================

pub mod core;
pub mod nbt;
pub mod relocate;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{BatchRequest, ConfigError, Destination, PRIMARY_DIMENSION};
pub use relocate::{
    BatchResult, BatchRunner, FailureKind, FileFailure, FileOutcome, PlayerRecord, run_batch,
};
