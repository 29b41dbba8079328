//! Storage adapter trait and error type

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a storage adapter
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Abstract durable key-value store
///
/// Implementations must treat values as opaque strings. A missing key is
/// `Ok(None)`, not an error.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`; deleting a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
