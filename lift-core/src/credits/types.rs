//! Credit actions, cost table, and transaction types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Actions that consume AI credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreditAction {
    /// ~30 min behavioral session
    MockInterview,
    /// Resume tailoring + cover letter + submit
    AiApplicationSubmit,
    /// Practice a single STAR story
    StoryPractice,
    /// AI resume tailoring only
    ResumeTailor,
    /// AI cover letter generation only
    CoverLetterGen,
    /// LinkedIn optimization kit generation
    LinkedInOptimize,
}

impl CreditAction {
    /// Every action kind, for exhaustive iteration in callers and tests
    pub const ALL: [CreditAction; 6] = [
        Self::MockInterview,
        Self::AiApplicationSubmit,
        Self::StoryPractice,
        Self::ResumeTailor,
        Self::CoverLetterGen,
        Self::LinkedInOptimize,
    ];

    /// Cost of this action in credits
    pub const fn cost(&self) -> u32 {
        match self {
            Self::MockInterview => 15,
            Self::AiApplicationSubmit => 8,
            Self::StoryPractice => 5,
            Self::ResumeTailor => 4,
            Self::CoverLetterGen => 4,
            Self::LinkedInOptimize => 6,
        }
    }

    /// Wire name, also the fallback transaction label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MockInterview => "mockInterview",
            Self::AiApplicationSubmit => "aiApplicationSubmit",
            Self::StoryPractice => "storyPractice",
            Self::ResumeTailor => "resumeTailor",
            Self::CoverLetterGen => "coverLetterGen",
            Self::LinkedInOptimize => "linkedInOptimize",
        }
    }
}

/// Subscription tiers governing the scan allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Starter,
    Pro,
    Unlimited,
}

impl SubscriptionTier {
    /// Scans included with this tier; `None` means unlimited
    pub const fn included_scan_credits(&self) -> Option<u32> {
        match self {
            Self::Starter => Some(10),
            Self::Pro => Some(50),
            Self::Unlimited => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Unlimited => "unlimited",
        }
    }
}

/// A single AI-credit spend, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: String,
    pub action: CreditAction,
    pub amount: u32,
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

/// Kind of scan-credit movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanTransactionKind {
    Usage,
    Purchase,
    TierChange,
}

/// A single scan-credit movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanTransaction {
    pub id: String,
    pub amount: u32,
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub kind: ScanTransactionKind,
}
