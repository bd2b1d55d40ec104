//! Unprotected read-then-write strategy
//!
//! Correct only when charges against an account never overlap. Two
//! concurrent charges can both read the same balance and both commit,
//! debiting more than the account holds. Kept for comparison with the
//! protected strategies.

use async_trait::async_trait;

use super::{read_balance, Attempt, ChargeStrategy, Decision};
use crate::store::BalanceStore;
use crate::types::{AccountKeys, ChargeError, ChargeResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveStrategy;

#[async_trait]
impl ChargeStrategy for NaiveStrategy {
    fn name(&self) -> &'static str {
        "naive"
    }

    async fn attempt(
        &self,
        store: &dyn BalanceStore,
        keys: &AccountKeys,
        amount: i64,
    ) -> Result<Attempt, ChargeError> {
        let balance = read_balance(store, &keys.balance).await?;

        let result = match Decision::for_balance(balance, amount)? {
            Decision::Debit { new_balance } => {
                store.set(&keys.balance, &new_balance.to_string()).await?;
                ChargeResult::authorized(new_balance, amount)
            }
            Decision::Decline => ChargeResult::insufficient_funds(balance),
        };
        Ok(Attempt::Decided(result))
    }
}
