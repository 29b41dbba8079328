//! Default experiment definitions per placement
//!
//! Every placement launches with its classic variant at full weight and two
//! weight-0 alternates, so new copy or cross-sell arms can be dialed up via
//! `set_variant_weights` without shipping new definitions.

use std::collections::BTreeMap;

use super::types::{CopyVariant, Placement, PlacementExperiment, PlacementVariant, Surface};

fn variant(id: &str, weight: u32, surface: Surface, copy_variant: CopyVariant) -> PlacementVariant {
    PlacementVariant {
        id: id.to_string(),
        weight,
        surface,
        copy_variant,
    }
}

/// Build the default experiment set covering every placement
pub fn default_experiments() -> BTreeMap<Placement, PlacementExperiment> {
    let mut experiments = BTreeMap::new();
    experiments.insert(
        Placement::SettingsUpgradePlan,
        PlacementExperiment {
            id: "exp_settings_upgrade_v1".to_string(),
            placement: Placement::SettingsUpgradePlan,
            variants: vec![
                variant("classic", 100, Surface::Subscription, CopyVariant::Classic),
                variant("value_pitch", 0, Surface::Subscription, CopyVariant::Value),
                variant("urgency_pitch", 0, Surface::Subscription, CopyVariant::Urgency),
            ],
        },
    );
    experiments.insert(
        Placement::SettingsBuyAiCredits,
        PlacementExperiment {
            id: "exp_settings_ai_credits_v1".to_string(),
            placement: Placement::SettingsBuyAiCredits,
            variants: vec![
                variant("classic", 100, Surface::AiCredits, CopyVariant::Classic),
                variant("value_pitch", 0, Surface::AiCredits, CopyVariant::Value),
                variant("upgrade_nudge", 0, Surface::Subscription, CopyVariant::Value),
            ],
        },
    );
    experiments.insert(
        Placement::SettingsBuyScanCredits,
        PlacementExperiment {
            id: "exp_settings_scan_credits_v1".to_string(),
            placement: Placement::SettingsBuyScanCredits,
            variants: vec![
                variant("classic", 100, Surface::ScanCredits, CopyVariant::Classic),
                variant("value_pitch", 0, Surface::ScanCredits, CopyVariant::Value),
                variant("upgrade_nudge", 0, Surface::Subscription, CopyVariant::Urgency),
            ],
        },
    );
    experiments.insert(
        Placement::InterviewGetMoreCredits,
        PlacementExperiment {
            id: "exp_interview_credits_v1".to_string(),
            placement: Placement::InterviewGetMoreCredits,
            variants: vec![
                variant("classic", 100, Surface::Subscription, CopyVariant::Classic),
                variant("value_pitch", 0, Surface::Subscription, CopyVariant::Value),
                variant("direct_ai_packs", 0, Surface::AiCredits, CopyVariant::Urgency),
            ],
        },
    );
    experiments
}
