//! Error types for lift-core

use thiserror::Error;

use lift_storage::StorageError;

/// Errors from an explicit flush to storage
///
/// Routine write-through persistence is best effort and never surfaces an
/// error; only [`flush`](crate::CreditsLedger::flush) reports one.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
