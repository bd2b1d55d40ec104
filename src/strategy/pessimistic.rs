//! Pessimistic locking strategy
//!
//! Takes the account's lock before touching the balance, so the
//! read-decide-write sequence never interleaves with another holder's:
//!
//! ```text
//! acquire(lock) ──busy──> Contended
//!      │
//!      ▼
//! read balance ─> decide ─> write (if debit) ─> release(lock) ─> Decided
//! ```
//!
//! The lock is released on every path once it was acquired, including the
//! declined path and the error path.

use std::time::Duration;

use async_trait::async_trait;

use super::{ensure_non_negative, read_balance, Attempt, ChargeStrategy, Decision};
use crate::core::DistributedLock;
use crate::store::BalanceStore;
use crate::types::{AccountKeys, ChargeError, ChargeResult};

/// Lock, read, decide, write, release
#[derive(Debug, Clone, Copy)]
pub struct PessimisticStrategy {
    lock_ttl: Duration,
}

impl PessimisticStrategy {
    /// Create a strategy whose lock tokens expire after `lock_ttl`
    pub fn new(lock_ttl: Duration) -> Self {
        Self { lock_ttl }
    }

    /// The critical section; runs only while the lock is held
    async fn debit_locked(
        store: &dyn BalanceStore,
        keys: &AccountKeys,
        amount: i64,
    ) -> Result<ChargeResult, ChargeError> {
        let balance = read_balance(store, &keys.balance).await?;

        match Decision::for_balance(balance, amount)? {
            Decision::Debit { new_balance } => {
                store.set(&keys.balance, &new_balance.to_string()).await?;
                Ok(ChargeResult::authorized(new_balance, amount))
            }
            Decision::Decline => Ok(ChargeResult::insufficient_funds(balance)),
        }
    }
}

#[async_trait]
impl ChargeStrategy for PessimisticStrategy {
    fn name(&self) -> &'static str {
        "pessimistic"
    }

    async fn attempt(
        &self,
        store: &dyn BalanceStore,
        keys: &AccountKeys,
        amount: i64,
    ) -> Result<Attempt, ChargeError> {
        ensure_non_negative(amount)?;
        let lock = DistributedLock::new(store, self.lock_ttl);

        let Some(token) = lock.acquire(&keys.lock).await? else {
            return Ok(Attempt::Contended);
        };

        let outcome = Self::debit_locked(store, keys, amount).await;

        // A failed release leaves the token to expire; the decision stands
        if let Err(e) = lock.release(token).await {
            tracing::warn!(lock = %keys.lock, error = %e, "failed to release lock");
        }

        outcome.map(Attempt::Decided)
    }
}
