//! Experiment assignment engine

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lift_storage::StorageAdapter;

use super::bucket::{bucket_input, hash_to_bucket};
use super::defaults::default_experiments;
use super::types::{CopyVariant, Placement, PlacementDecision, PlacementExperiment, Surface};
use crate::error::PersistError;
use crate::persist::write_through;

/// Storage key for the serialized engine blob
const EXPERIMENTS_KEY: &str = "lift.experiments";

/// Full serialized engine state: definitions, sticky assignments, overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ExperimentsState {
    experiments: BTreeMap<Placement, PlacementExperiment>,
    assignments: BTreeMap<Placement, PlacementDecision>,
    overrides: BTreeMap<Placement, String>,
}

impl Default for ExperimentsState {
    fn default() -> Self {
        Self {
            experiments: default_experiments(),
            assignments: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }
}

impl ExperimentsState {
    /// Backfill experiments for placements missing from a persisted blob, so
    /// every placement always resolves
    fn normalize(mut self) -> Self {
        for (placement, experiment) in default_experiments() {
            self.experiments.entry(placement).or_insert(experiment);
        }
        self
    }
}

/// Deterministic, sticky bucketing of seed keys into placement variants
///
/// Constructed once at application start and shared by reference. All
/// operations are synchronous; each mutation writes the full state through
/// to storage fire-and-forget.
pub struct ExperimentAssignmentEngine {
    state: RwLock<ExperimentsState>,
    storage: Arc<dyn StorageAdapter>,
}

impl ExperimentAssignmentEngine {
    /// Restore the engine from storage, falling back to defaults when the
    /// blob is missing or unreadable
    pub async fn load(storage: Arc<dyn StorageAdapter>) -> Self {
        let state = match storage.get(EXPERIMENTS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<ExperimentsState>(&raw) {
                Ok(state) => state.normalize(),
                Err(e) => {
                    warn!("stored experiments state is unreadable, using defaults: {e}");
                    ExperimentsState::default()
                }
            },
            Ok(None) => ExperimentsState::default(),
            Err(e) => {
                warn!("failed to read experiments state, using defaults: {e}");
                ExperimentsState::default()
            }
        };
        Self {
            state: RwLock::new(state),
            storage,
        }
    }

    /// Current experiment definition for a placement
    pub fn experiment(&self, placement: Placement) -> PlacementExperiment {
        self.state
            .read()
            .unwrap()
            .experiments
            .get(&placement)
            .expect("every placement has an experiment")
            .clone()
    }

    /// Forced variant id for a placement, if any
    pub fn override_for(&self, placement: Placement) -> Option<String> {
        self.state.read().unwrap().overrides.get(&placement).cloned()
    }

    /// Cached decision for a placement, if one has been evaluated
    pub fn cached_assignment(&self, placement: Placement) -> Option<PlacementDecision> {
        self.state.read().unwrap().assignments.get(&placement).cloned()
    }

    /// Resolve the variant for a (placement, seed key) pair
    ///
    /// A cached decision is returned unchanged while the seed and experiment
    /// id still match and no override is set; otherwise the seed is hashed
    /// into a bucket, the override (when valid) or the cumulative weight walk
    /// picks the variant, buckets past the total weight fall into the
    /// holdout, and the decision is cached for the placement.
    pub fn evaluate_placement(&self, placement: Placement, seed_key: &str) -> PlacementDecision {
        let (decision, snapshot) = {
            let mut state = self.state.write().unwrap();
            let experiment = state
                .experiments
                .get(&placement)
                .expect("every placement has an experiment")
                .clone();

            if let Some(existing) = state.assignments.get(&placement) {
                if existing.seed_key == seed_key
                    && existing.experiment_id == experiment.id
                    && !state.overrides.contains_key(&placement)
                {
                    return existing.clone();
                }
            }

            let bucket =
                hash_to_bucket(&bucket_input(seed_key, placement.as_str(), &experiment.id));
            let override_id = state.overrides.get(&placement).cloned();
            let decision = resolve_decision(
                placement,
                &experiment,
                seed_key,
                bucket,
                override_id.as_deref(),
            );
            debug!(
                placement = placement.as_str(),
                bucket,
                variant = decision.variant_id.as_str(),
                "placement evaluated"
            );

            state.assignments.insert(placement, decision.clone());
            (decision, state.clone())
        };
        write_through(&self.storage, EXPERIMENTS_KEY, &snapshot);
        decision
    }

    /// Set or clear the forced variant for a placement
    ///
    /// Invalidates the placement's cached assignment either way, so the next
    /// evaluation recomputes.
    pub fn set_placement_override(&self, placement: Placement, variant_id: Option<&str>) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            match variant_id {
                Some(id) => {
                    state.overrides.insert(placement, id.to_string());
                }
                None => {
                    state.overrides.remove(&placement);
                }
            }
            state.assignments.remove(&placement);
            state.clone()
        };
        write_through(&self.storage, EXPERIMENTS_KEY, &snapshot);
    }

    /// Replace variant weights for a placement
    ///
    /// Supplied weights are clamped to `max(0, round(w))`; variants absent
    /// from `weights` keep their current weight. Invalidates the placement's
    /// cached assignment.
    pub fn set_variant_weights(&self, placement: Placement, weights: &HashMap<String, f64>) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            let experiment = state
                .experiments
                .get_mut(&placement)
                .expect("every placement has an experiment");
            for variant in &mut experiment.variants {
                if let Some(&weight) = weights.get(&variant.id) {
                    variant.weight = weight.round().max(0.0) as u32;
                }
            }
            state.assignments.remove(&placement);
            state.clone()
        };
        write_through(&self.storage, EXPERIMENTS_KEY, &snapshot);
    }

    /// Drop all cached decisions, forcing recomputation on next evaluation
    pub fn clear_assignments(&self) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            state.assignments.clear();
            state.clone()
        };
        write_through(&self.storage, EXPERIMENTS_KEY, &snapshot);
    }

    /// Restore default experiments, clearing all overrides and assignments
    pub fn reset_experiments(&self) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            *state = ExperimentsState::default();
            state.clone()
        };
        write_through(&self.storage, EXPERIMENTS_KEY, &snapshot);
    }

    /// Serialize the current state and await the storage write
    pub async fn flush(&self) -> Result<(), PersistError> {
        let snapshot = self.state.read().unwrap().clone();
        let payload = serde_json::to_string(&snapshot)?;
        self.storage.set(EXPERIMENTS_KEY, &payload).await?;
        Ok(())
    }
}

/// Pick the variant for a bucket, honoring a valid override first
///
/// The bucket is computed before the override check but an override that
/// names a real variant wins regardless of where the bucket fell.
fn resolve_decision(
    placement: Placement,
    experiment: &PlacementExperiment,
    seed_key: &str,
    bucket: u32,
    override_id: Option<&str>,
) -> PlacementDecision {
    let now = Utc::now();

    let forced = override_id.and_then(|id| experiment.variants.iter().find(|v| v.id == id));
    if let Some(variant) = forced {
        return PlacementDecision {
            placement,
            experiment_id: experiment.id.clone(),
            variant_id: variant.id.clone(),
            surface: variant.surface,
            copy_variant: variant.copy_variant,
            is_holdout: false,
            assigned_at: now,
            seed_key: seed_key.to_string(),
        };
    }

    let mut cumulative = 0;
    for variant in &experiment.variants {
        cumulative += variant.weight;
        if bucket < cumulative {
            return PlacementDecision {
                placement,
                experiment_id: experiment.id.clone(),
                variant_id: variant.id.clone(),
                surface: variant.surface,
                copy_variant: variant.copy_variant,
                is_holdout: false,
                assigned_at: now,
                seed_key: seed_key.to_string(),
            };
        }
    }

    // Total weight below 100: the uncovered tail is the holdout
    PlacementDecision {
        placement,
        experiment_id: experiment.id.clone(),
        variant_id: "holdout".to_string(),
        surface: Surface::Holdout,
        copy_variant: CopyVariant::Classic,
        is_holdout: true,
        assigned_at: now,
        seed_key: seed_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lift_storage::MemoryStorage;

    async fn fresh_engine() -> ExperimentAssignmentEngine {
        ExperimentAssignmentEngine::load(Arc::new(MemoryStorage::new())).await
    }

    fn weights(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(id, w)| (id.to_string(), *w)).collect()
    }

    #[tokio::test]
    async fn assignment_is_sticky_for_the_same_placement_and_seed() {
        let engine = fresh_engine().await;
        let first = engine.evaluate_placement(Placement::SettingsBuyAiCredits, "user-123");
        let second = engine.evaluate_placement(Placement::SettingsBuyAiCredits, "user-123");
        // Cached decision is returned bit-identical, assigned_at included
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn default_experiments_assign_the_classic_variant() {
        let engine = fresh_engine().await;
        for placement in Placement::ALL {
            let decision = engine.evaluate_placement(placement, "user-123");
            assert_eq!(decision.variant_id, "classic");
            assert!(!decision.is_holdout);
        }
    }

    #[tokio::test]
    async fn assignment_is_deterministic_across_engine_instances() {
        let first = fresh_engine().await;
        let second = fresh_engine().await;
        for placement in Placement::ALL {
            let a = first.evaluate_placement(placement, "user-789");
            let b = second.evaluate_placement(placement, "user-789");
            assert_eq!(a.variant_id, b.variant_id);
            assert_eq!(a.surface, b.surface);
            assert_eq!(a.experiment_id, b.experiment_id);
        }
    }

    #[tokio::test]
    async fn new_seed_key_invalidates_the_cached_decision() {
        let engine = fresh_engine().await;
        let first = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-a");
        assert_eq!(first.seed_key, "user-a");
        let second = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-b");
        assert_eq!(second.seed_key, "user-b");
    }

    #[tokio::test]
    async fn weight_walk_follows_declaration_order() {
        let engine = fresh_engine().await;
        engine.set_variant_weights(
            Placement::SettingsUpgradePlan,
            &weights(&[("classic", 50.0), ("value_pitch", 30.0), ("urgency_pitch", 0.0)]),
        );

        // Buckets: user-2 -> 3, user-3 -> 68, user-1 -> 98
        let low = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-2");
        assert_eq!(low.variant_id, "classic");

        let mid = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-3");
        assert_eq!(mid.variant_id, "value_pitch");
        assert_eq!(mid.copy_variant, CopyVariant::Value);

        let tail = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-1");
        assert!(tail.is_holdout);
        assert_eq!(tail.variant_id, "holdout");
        assert_eq!(tail.surface, Surface::Holdout);
    }

    #[tokio::test]
    async fn zero_total_weight_always_holds_out() {
        let engine = fresh_engine().await;
        engine.set_variant_weights(
            Placement::SettingsBuyScanCredits,
            &weights(&[("classic", 0.0), ("value_pitch", 0.0), ("upgrade_nudge", 0.0)]),
        );
        engine.clear_assignments();

        for seed in ["user-holdout", "user-1", "user-2", "anyone"] {
            let decision = engine.evaluate_placement(Placement::SettingsBuyScanCredits, seed);
            assert!(decision.is_holdout);
            assert_eq!(decision.variant_id, "holdout");
            assert_eq!(decision.surface, Surface::Holdout);
            assert_eq!(decision.copy_variant, CopyVariant::Classic);
        }
    }

    #[tokio::test]
    async fn override_takes_precedence_over_the_bucket() {
        let engine = fresh_engine().await;
        engine.set_placement_override(Placement::InterviewGetMoreCredits, Some("direct_ai_packs"));

        for seed in ["user-override", "user-1", "user-2"] {
            let decision = engine.evaluate_placement(Placement::InterviewGetMoreCredits, seed);
            assert_eq!(decision.variant_id, "direct_ai_packs");
            assert_eq!(decision.surface, Surface::AiCredits);
            assert!(!decision.is_holdout);
        }
    }

    #[tokio::test]
    async fn clearing_an_override_recomputes_normally() {
        let engine = fresh_engine().await;
        engine.set_placement_override(Placement::InterviewGetMoreCredits, Some("direct_ai_packs"));
        let forced = engine.evaluate_placement(Placement::InterviewGetMoreCredits, "user-1");
        assert_eq!(forced.variant_id, "direct_ai_packs");

        engine.set_placement_override(Placement::InterviewGetMoreCredits, None);
        assert_eq!(engine.override_for(Placement::InterviewGetMoreCredits), None);
        let normal = engine.evaluate_placement(Placement::InterviewGetMoreCredits, "user-1");
        assert_eq!(normal.variant_id, "classic");
    }

    #[tokio::test]
    async fn override_naming_an_unknown_variant_falls_through_to_weights() {
        let engine = fresh_engine().await;
        engine.set_placement_override(Placement::SettingsUpgradePlan, Some("no_such_variant"));
        let decision = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-1");
        assert_eq!(decision.variant_id, "classic");
    }

    #[tokio::test]
    async fn weight_change_invalidates_the_cached_assignment() {
        let engine = fresh_engine().await;
        let before = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-3");
        assert_eq!(before.variant_id, "classic");

        // Bucket for user-3 is 68, past the new 50-weight classic range
        engine.set_variant_weights(
            Placement::SettingsUpgradePlan,
            &weights(&[("classic", 50.0), ("value_pitch", 30.0)]),
        );
        assert_eq!(engine.cached_assignment(Placement::SettingsUpgradePlan), None);

        let after = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-3");
        assert_eq!(after.variant_id, "value_pitch");
    }

    #[tokio::test]
    async fn unspecified_variants_keep_their_weight() {
        let engine = fresh_engine().await;
        engine.set_variant_weights(
            Placement::SettingsUpgradePlan,
            &weights(&[("classic", 40.0)]),
        );
        let experiment = engine.experiment(Placement::SettingsUpgradePlan);
        assert_eq!(experiment.variants[0].weight, 40);
        assert_eq!(experiment.variants[1].weight, 0);
        assert_eq!(experiment.variants[2].weight, 0);

        // user-3 buckets at 68, past the 40 allocated
        let decision = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-3");
        assert!(decision.is_holdout);
    }

    #[tokio::test]
    async fn negative_and_fractional_weights_are_clamped_and_rounded() {
        let engine = fresh_engine().await;
        engine.set_variant_weights(
            Placement::SettingsUpgradePlan,
            &weights(&[("classic", -20.0), ("value_pitch", 49.6)]),
        );
        let experiment = engine.experiment(Placement::SettingsUpgradePlan);
        assert_eq!(experiment.variants[0].weight, 0);
        assert_eq!(experiment.variants[1].weight, 50);
    }

    #[tokio::test]
    async fn clear_assignments_forces_recomputation() {
        let engine = fresh_engine().await;
        let first = engine.evaluate_placement(Placement::SettingsBuyAiCredits, "user-123");
        assert!(engine.cached_assignment(Placement::SettingsBuyAiCredits).is_some());

        engine.clear_assignments();
        assert!(engine.cached_assignment(Placement::SettingsBuyAiCredits).is_none());

        let second = engine.evaluate_placement(Placement::SettingsBuyAiCredits, "user-123");
        assert_eq!(first.variant_id, second.variant_id);
        assert_eq!(first.surface, second.surface);
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_drops_overrides() {
        let engine = fresh_engine().await;
        engine.set_variant_weights(
            Placement::SettingsUpgradePlan,
            &weights(&[("classic", 10.0)]),
        );
        engine.set_placement_override(Placement::SettingsBuyAiCredits, Some("value_pitch"));
        engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-1");

        engine.reset_experiments();

        let experiment = engine.experiment(Placement::SettingsUpgradePlan);
        assert_eq!(experiment.variants[0].weight, 100);
        assert_eq!(engine.override_for(Placement::SettingsBuyAiCredits), None);
        for placement in Placement::ALL {
            assert!(engine.cached_assignment(placement).is_none());
        }
    }

    #[tokio::test]
    async fn flush_then_load_round_trips_state() {
        let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        let adapter: Arc<dyn StorageAdapter> = storage.clone();

        let engine = ExperimentAssignmentEngine::load(adapter.clone()).await;
        engine.set_variant_weights(
            Placement::SettingsUpgradePlan,
            &weights(&[("classic", 50.0), ("value_pitch", 30.0)]),
        );
        engine.set_placement_override(Placement::InterviewGetMoreCredits, Some("direct_ai_packs"));
        let decision = engine.evaluate_placement(Placement::SettingsUpgradePlan, "user-3");
        engine.flush().await.unwrap();

        let restored = ExperimentAssignmentEngine::load(adapter).await;
        let experiment = restored.experiment(Placement::SettingsUpgradePlan);
        assert_eq!(experiment.variants[0].weight, 50);
        assert_eq!(
            restored.override_for(Placement::InterviewGetMoreCredits).as_deref(),
            Some("direct_ai_packs")
        );
        // Sticky decision survives the restart bit-identical
        let sticky = restored.evaluate_placement(Placement::SettingsUpgradePlan, "user-3");
        assert_eq!(sticky, decision);
    }

    #[tokio::test]
    async fn unreadable_blob_falls_back_to_defaults() {
        let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        storage.set(EXPERIMENTS_KEY, "{{{{").await.unwrap();

        let adapter: Arc<dyn StorageAdapter> = storage.clone();
        let engine = ExperimentAssignmentEngine::load(adapter).await;
        let experiment = engine.experiment(Placement::SettingsUpgradePlan);
        assert_eq!(experiment.id, "exp_settings_upgrade_v1");
    }

    #[tokio::test]
    async fn partial_blob_is_backfilled_with_default_experiments() {
        let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        // A blob persisted before a placement existed: valid shape, missing keys
        storage
            .set(
                EXPERIMENTS_KEY,
                "{\"experiments\":{},\"assignments\":{},\"overrides\":{}}",
            )
            .await
            .unwrap();

        let adapter: Arc<dyn StorageAdapter> = storage.clone();
        let engine = ExperimentAssignmentEngine::load(adapter).await;
        for placement in Placement::ALL {
            let decision = engine.evaluate_placement(placement, "user-1");
            assert_eq!(decision.variant_id, "classic");
        }
    }
}
