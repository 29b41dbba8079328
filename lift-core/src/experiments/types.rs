//! Placement, variant, and decision types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monetization placements within the app
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    SettingsUpgradePlan,
    SettingsBuyAiCredits,
    SettingsBuyScanCredits,
    InterviewGetMoreCredits,
}

impl Placement {
    /// Every placement, for exhaustive iteration
    pub const ALL: [Placement; 4] = [
        Self::SettingsUpgradePlan,
        Self::SettingsBuyAiCredits,
        Self::SettingsBuyScanCredits,
        Self::InterviewGetMoreCredits,
    ];

    /// Wire name, also the hash-input component for bucketing
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SettingsUpgradePlan => "settings_upgrade_plan",
            Self::SettingsBuyAiCredits => "settings_buy_ai_credits",
            Self::SettingsBuyScanCredits => "settings_buy_scan_credits",
            Self::InterviewGetMoreCredits => "interview_get_more_credits",
        }
    }
}

/// Which monetization UI a decision routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Subscription,
    AiCredits,
    ScanCredits,
    Holdout,
}

/// Tone of the monetization copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyVariant {
    Classic,
    Value,
    Urgency,
}

/// One weighted arm of a placement experiment
///
/// Weights are relative and need not sum to 100; buckets above the total
/// weight fall into the holdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementVariant {
    pub id: String,
    pub weight: u32,
    pub surface: Surface,
    pub copy_variant: CopyVariant,
}

/// A placement's experiment definition
///
/// Variant order matters: the cumulative weight walk assigns bucket ranges
/// in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementExperiment {
    pub id: String,
    pub placement: Placement,
    pub variants: Vec<PlacementVariant>,
}

/// The resolved, cacheable outcome for one (placement, seed key) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDecision {
    pub placement: Placement,
    pub experiment_id: String,
    pub variant_id: String,
    pub surface: Surface,
    pub copy_variant: CopyVariant,
    pub is_holdout: bool,
    pub assigned_at: DateTime<Utc>,
    pub seed_key: String,
}
