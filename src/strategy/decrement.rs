//! Atomic decrement with compensation
//!
//! Subtracts first with the store's atomic add, then checks the result. A
//! negative result is undone with a compensating add and the charge is
//! declined. No request ever gets authorized against funds it does not have,
//! but a negative balance is briefly visible in the store, and a concurrent
//! charge that observes it is declined even if the funds would have covered
//! it once the compensation lands.
//!
//! A decline reports the balance the decrement landed on, which is what the
//! charge observed. Another charge's uncompensated overdraft can make that
//! value negative; the committed balance never is, so the report floors at 0.

use async_trait::async_trait;

use super::{ensure_non_negative, read_balance, Attempt, ChargeStrategy};
use crate::store::BalanceStore;
use crate::types::{AccountKeys, ChargeError, ChargeResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct DecrementStrategy;

#[async_trait]
impl ChargeStrategy for DecrementStrategy {
    fn name(&self) -> &'static str {
        "decrement"
    }

    async fn attempt(
        &self,
        store: &dyn BalanceStore,
        keys: &AccountKeys,
        amount: i64,
    ) -> Result<Attempt, ChargeError> {
        ensure_non_negative(amount)?;
        // An absent key would count as 0 and get created by the add
        let balance = read_balance(store, &keys.balance).await?;
        let delta = amount
            .checked_neg()
            .ok_or_else(|| ChargeError::overflow(balance, amount))?;

        let remaining = store.incr_by(&keys.balance, delta).await?;
        if remaining >= 0 {
            return Ok(Attempt::Decided(ChargeResult::authorized(remaining, amount)));
        }

        let restored = store.incr_by(&keys.balance, amount).await?;
        let observed = remaining
            .checked_add(amount)
            .ok_or_else(|| ChargeError::overflow(remaining, amount))?;
        tracing::debug!(
            balance_key = %keys.balance,
            overdrawn = remaining,
            observed,
            restored,
            "compensated overdraft"
        );
        Ok(Attempt::Decided(ChargeResult::insufficient_funds(
            observed.max(0),
        )))
    }
}
