//! lift-storage: durable key-value port for the Career Lift client stores
//!
//! Stores persist their whole state as one serialized blob under a fixed,
//! store-specific key. The port is deliberately tiny:
//!
//! - [`StorageAdapter`] - the async get/set/remove trait
//! - [`MemoryStorage`] - in-memory adapter for tests
//! - [`FileStorage`] - one file per key under a caller-supplied directory

pub mod adapter;
pub mod file;
pub mod memory;

pub use adapter::{StorageAdapter, StorageError};
pub use file::FileStorage;
pub use memory::MemoryStorage;
