//! Credits ledger for AI-powered feature gating
//!
//! Two cooperating sub-ledgers live here: AI credits (a spendable balance
//! with a per-action cost table) and scan credits (a per-subscription-tier
//! allowance consumed one scan at a time).

pub mod ledger;
pub mod types;

pub use ledger::CreditsLedger;
pub use types::{
    CreditAction, CreditTransaction, ScanTransaction, ScanTransactionKind, SubscriptionTier,
};
