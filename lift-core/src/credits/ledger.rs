//! Credits ledger store

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use lift_storage::StorageAdapter;

use super::types::{
    CreditAction, CreditTransaction, ScanTransaction, ScanTransactionKind, SubscriptionTier,
};
use crate::error::PersistError;
use crate::persist::write_through;

/// Storage key for the serialized ledger blob
const CREDITS_KEY: &str = "lift.credits";

/// Starter balance granted on first use
const DEFAULT_BALANCE: u32 = 150;

const DEFAULT_TIER: SubscriptionTier = SubscriptionTier::Pro;

/// Most recent credit transactions retained
const HISTORY_LIMIT: usize = 20;

/// Most recent scan transactions retained
const SCAN_HISTORY_LIMIT: usize = 30;

/// Full serialized ledger state
///
/// Invariant: `balance == total_credits - total_spent` after every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CreditsState {
    balance: u32,
    total_credits: u32,
    total_spent: u32,
    history: Vec<CreditTransaction>,
    subscription_tier: SubscriptionTier,
    scan_credits_remaining: Option<u32>,
    total_scans_used: u32,
    total_scan_credits_purchased: u32,
    scan_history: Vec<ScanTransaction>,
}

impl Default for CreditsState {
    fn default() -> Self {
        Self {
            balance: DEFAULT_BALANCE,
            total_credits: DEFAULT_BALANCE,
            total_spent: 0,
            history: Vec::new(),
            subscription_tier: DEFAULT_TIER,
            scan_credits_remaining: DEFAULT_TIER.included_scan_credits(),
            total_scans_used: 0,
            total_scan_credits_purchased: 0,
            scan_history: Vec::new(),
        }
    }
}

/// Spendable credit balance gating AI-powered features
///
/// Constructed once at application start and shared by reference. All
/// operations are synchronous; each mutation writes the full state through
/// to storage fire-and-forget.
pub struct CreditsLedger {
    state: RwLock<CreditsState>,
    storage: Arc<dyn StorageAdapter>,
}

impl CreditsLedger {
    /// Restore the ledger from storage, falling back to defaults when the
    /// blob is missing or unreadable
    pub async fn load(storage: Arc<dyn StorageAdapter>) -> Self {
        let state = match storage.get(CREDITS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    warn!("stored credits state is unreadable, using defaults: {e}");
                    CreditsState::default()
                }
            },
            Ok(None) => CreditsState::default(),
            Err(e) => {
                warn!("failed to read credits state, using defaults: {e}");
                CreditsState::default()
            }
        };
        Self {
            state: RwLock::new(state),
            storage,
        }
    }

    /// Current spendable balance
    pub fn balance(&self) -> u32 {
        self.state.read().unwrap().balance
    }

    /// Lifetime credits ever granted
    pub fn total_credits(&self) -> u32 {
        self.state.read().unwrap().total_credits
    }

    /// Lifetime credits consumed
    pub fn total_spent(&self) -> u32 {
        self.state.read().unwrap().total_spent
    }

    /// Recent spend history, newest first
    pub fn history(&self) -> Vec<CreditTransaction> {
        self.state.read().unwrap().history.clone()
    }

    /// Cost of an action in credits
    pub fn cost(&self, action: CreditAction) -> u32 {
        action.cost()
    }

    /// Whether the balance covers the cost of `action`
    pub fn can_afford(&self, action: CreditAction) -> bool {
        self.balance() >= action.cost()
    }

    /// Spend credits for an action
    ///
    /// Returns `false` without mutating anything when the balance is
    /// insufficient; that is an expected condition callers branch on, not an
    /// error. On success the spend is recorded in history with `label` (or
    /// the action name when absent).
    pub fn spend_credits(&self, action: CreditAction, label: Option<&str>) -> bool {
        let cost = action.cost();
        let snapshot = {
            let mut state = self.state.write().unwrap();
            if state.balance < cost {
                debug!(action = action.as_str(), cost, balance = state.balance, "spend rejected");
                return false;
            }

            let tx = CreditTransaction {
                id: Uuid::new_v4().to_string(),
                action,
                amount: cost,
                timestamp: Utc::now(),
                label: label.unwrap_or(action.as_str()).to_string(),
            };

            state.balance -= cost;
            state.total_spent += cost;
            state.history.insert(0, tx);
            state.history.truncate(HISTORY_LIMIT);
            state.clone()
        };
        write_through(&self.storage, CREDITS_KEY, &snapshot);
        true
    }

    /// Add credits to the balance (purchase, bonus, etc.)
    pub fn add_credits(&self, amount: u32) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            state.balance += amount;
            state.total_credits += amount;
            state.clone()
        };
        write_through(&self.storage, CREDITS_KEY, &snapshot);
    }

    /// Active subscription tier
    pub fn subscription_tier(&self) -> SubscriptionTier {
        self.state.read().unwrap().subscription_tier
    }

    /// Remaining scans on the current tier plus purchased packs; `None`
    /// means unlimited
    pub fn scan_credits_remaining(&self) -> Option<u32> {
        self.state.read().unwrap().scan_credits_remaining
    }

    /// Lifetime scans consumed
    pub fn total_scans_used(&self) -> u32 {
        self.state.read().unwrap().total_scans_used
    }

    /// Lifetime scan credits bought via one-time packs
    pub fn total_scan_credits_purchased(&self) -> u32 {
        self.state.read().unwrap().total_scan_credits_purchased
    }

    /// Recent scan-credit history, newest first
    pub fn scan_history(&self) -> Vec<ScanTransaction> {
        self.state.read().unwrap().scan_history.clone()
    }

    /// Whether a scan can run right now
    pub fn can_use_scan(&self) -> bool {
        match self.scan_credits_remaining() {
            None => true,
            Some(remaining) => remaining > 0,
        }
    }

    /// Spend one scan credit
    ///
    /// Returns `false` when a counted tier has no scans left.
    pub fn spend_scan_credit(&self, label: Option<&str>) -> bool {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            if matches!(state.scan_credits_remaining, Some(0)) {
                return false;
            }

            let tx = ScanTransaction {
                id: Uuid::new_v4().to_string(),
                amount: 1,
                timestamp: Utc::now(),
                label: label.unwrap_or("Job scan").to_string(),
                kind: ScanTransactionKind::Usage,
            };

            state.scan_credits_remaining = state.scan_credits_remaining.map(|r| r.saturating_sub(1));
            state.total_scans_used += 1;
            state.scan_history.insert(0, tx);
            state.scan_history.truncate(SCAN_HISTORY_LIMIT);
            state.clone()
        };
        write_through(&self.storage, CREDITS_KEY, &snapshot);
        true
    }

    /// Add scan credits via a one-time pack purchase; a zero amount is a no-op
    pub fn add_scan_credits(&self, amount: u32, label: Option<&str>) {
        if amount == 0 {
            return;
        }
        let snapshot = {
            let mut state = self.state.write().unwrap();
            let tx = ScanTransaction {
                id: Uuid::new_v4().to_string(),
                amount,
                timestamp: Utc::now(),
                label: label.map(str::to_string).unwrap_or_else(|| format!("{amount} scan credits")),
                kind: ScanTransactionKind::Purchase,
            };

            state.scan_credits_remaining = state.scan_credits_remaining.map(|r| r + amount);
            state.total_scan_credits_purchased += amount;
            state.scan_history.insert(0, tx);
            state.scan_history.truncate(SCAN_HISTORY_LIMIT);
            state.clone()
        };
        write_through(&self.storage, CREDITS_KEY, &snapshot);
    }

    /// Switch subscription tier and reset the scan allowance to the tier's
    /// included amount
    pub fn set_subscription_tier(&self, tier: SubscriptionTier) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            let included = tier.included_scan_credits();
            let tx = ScanTransaction {
                id: Uuid::new_v4().to_string(),
                amount: included.unwrap_or(0),
                timestamp: Utc::now(),
                label: format!("Tier switched to {}", tier.as_str()),
                kind: ScanTransactionKind::TierChange,
            };

            state.subscription_tier = tier;
            state.scan_credits_remaining = included;
            state.scan_history.insert(0, tx);
            state.scan_history.truncate(SCAN_HISTORY_LIMIT);
            state.clone()
        };
        write_through(&self.storage, CREDITS_KEY, &snapshot);
    }

    /// Restore the ledger to its default state
    pub fn reset_credits(&self) {
        let snapshot = {
            let mut state = self.state.write().unwrap();
            *state = CreditsState::default();
            state.clone()
        };
        write_through(&self.storage, CREDITS_KEY, &snapshot);
    }

    /// Serialize the current state and await the storage write
    pub async fn flush(&self) -> Result<(), PersistError> {
        let snapshot = self.state.read().unwrap().clone();
        let payload = serde_json::to_string(&snapshot)?;
        self.storage.set(CREDITS_KEY, &payload).await?;
        Ok(())
    }
}
