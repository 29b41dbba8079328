//! Deterministic experiment assignment for monetization placements
//!
//! Each placement carries one weighted experiment; a seed key (typically the
//! user id) is hashed into a stable bucket in `[0, 100)` and walked against
//! the variants' cumulative weights, with sticky caching of the resulting
//! decision and per-placement debug overrides.

pub mod bucket;
pub mod defaults;
pub mod engine;
pub mod types;

pub use engine::ExperimentAssignmentEngine;
pub use types::{
    CopyVariant, Placement, PlacementDecision, PlacementExperiment, PlacementVariant, Surface,
};
