//! Charge result types
//!
//! `ChargeResult` is what callers render. The three wire fields
//! (`isAuthorized`, `remainingBalance`, `charges`) keep their historical shape;
//! `outcome` tells a genuine zero balance apart from contention or an
//! internal failure.

use serde::{Deserialize, Serialize};

use super::error::ChargeError;

/// Why a charge ended the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeOutcome {
    /// The amount was debited and the new balance committed
    Authorized,

    /// The balance observed under exclusion was smaller than the amount
    InsufficientFunds,

    /// The retry budget ran out before exclusion could be obtained
    Contended,

    /// The store failed or held unusable data; nothing was debited
    Error,
}

/// Result of a single charge request
///
/// # Invariants
///
/// - `is_authorized == false` implies `charges == 0`
/// - For `InsufficientFunds`, `remaining_balance` is the balance observed at
///   decision time
/// - For `Contended` and `Error`, `remaining_balance` is 0 and carries no
///   information; inspect `outcome`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeResult {
    pub is_authorized: bool,
    pub remaining_balance: i64,
    pub charges: i64,
    pub outcome: ChargeOutcome,
}

impl ChargeResult {
    /// The debit of `charges` was committed, leaving `remaining_balance`
    pub fn authorized(remaining_balance: i64, charges: i64) -> Self {
        Self {
            is_authorized: true,
            remaining_balance,
            charges,
            outcome: ChargeOutcome::Authorized,
        }
    }

    /// Declined because `observed_balance` could not cover the amount
    pub fn insufficient_funds(observed_balance: i64) -> Self {
        Self {
            is_authorized: false,
            remaining_balance: observed_balance,
            charges: 0,
            outcome: ChargeOutcome::InsufficientFunds,
        }
    }

    /// Declined because the account stayed contended for the whole retry budget
    pub fn contended() -> Self {
        Self {
            is_authorized: false,
            remaining_balance: 0,
            charges: 0,
            outcome: ChargeOutcome::Contended,
        }
    }

    /// Declined because of an internal failure
    pub fn failed() -> Self {
        Self {
            is_authorized: false,
            remaining_balance: 0,
            charges: 0,
            outcome: ChargeOutcome::Error,
        }
    }
}

impl From<&ChargeError> for ChargeResult {
    /// Fail-closed mapping: every error becomes a declined result
    fn from(error: &ChargeError) -> Self {
        match error {
            ChargeError::Contended { .. } => ChargeResult::contended(),
            _ => ChargeResult::failed(),
        }
    }
}
