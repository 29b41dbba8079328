//! lift-core: client-side state stores for the Career Lift module
//!
//! This crate provides the two stores backing the Career Lift screens:
//!
//! - **Credits ledger** - [`CreditsLedger`] gates AI-powered features behind a
//!   spendable, persisted credit balance and tracks scan allowances per
//!   subscription tier
//! - **Experiment assignment** - [`ExperimentAssignmentEngine`] deterministically
//!   buckets a seed key into one weighted variant per monetization placement,
//!   with sticky caching and debug overrides
//!
//! Both stores are constructed once at application start from a
//! [`StorageAdapter`](lift_storage::StorageAdapter) and handed by reference to
//! consumers. Operations are synchronous; every mutation write-through
//! persists the full store state fire-and-forget, and [`CreditsLedger::flush`]
//! / [`ExperimentAssignmentEngine::flush`] await durability explicitly.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lift_core::{CreditAction, CreditsLedger};
//! use lift_storage::MemoryStorage;
//!
//! # async fn example() {
//! let storage = Arc::new(MemoryStorage::new());
//! let ledger = CreditsLedger::load(storage).await;
//!
//! if ledger.spend_credits(CreditAction::MockInterview, Some("Behavioral Session")) {
//!     println!("remaining: {}", ledger.balance());
//! }
//! # }
//! ```

pub mod credits;
pub mod error;
pub mod experiments;

mod persist;

// Re-export key types for convenience
pub use credits::{
    CreditAction, CreditTransaction, CreditsLedger, ScanTransaction, ScanTransactionKind,
    SubscriptionTier,
};
pub use error::PersistError;
pub use experiments::{
    CopyVariant, ExperimentAssignmentEngine, Placement, PlacementDecision, PlacementExperiment,
    PlacementVariant, Surface,
};
