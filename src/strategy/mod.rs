//! Charge strategy module
//!
//! This module defines the Strategy pattern for the read-decide-write step of
//! a charge. Each strategy performs a single attempt; the authorizer owns the
//! retry loop, the backoff, and the fail-closed boundary around it.
//!
//! # Strategies
//!
//! | Strategy      | Exclusion                    | Safe under concurrency |
//! |---------------|------------------------------|------------------------|
//! | `pessimistic` | lock token with TTL          | yes                    |
//! | `optimistic`  | compare-and-swap on balance  | yes                    |
//! | `naive`       | none                         | no                     |
//! | `decrement`   | atomic add, then compensate  | never overdraws, but commits transient negatives |
//!
//! Only `pessimistic` is used unless another strategy is selected explicitly.

use async_trait::async_trait;

use crate::cli::StrategyType;
use crate::core::AuthorizerConfig;
use crate::store::{parse_balance, BalanceStore};
use crate::types::{AccountKeys, ChargeError, ChargeResult};

pub mod decrement;
pub mod naive;
pub mod optimistic;
pub mod pessimistic;

pub use decrement::DecrementStrategy;
pub use naive::NaiveStrategy;
pub use optimistic::OptimisticStrategy;
pub use pessimistic::PessimisticStrategy;

/// Outcome of a single attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// A decision was reached; no retry needed
    Decided(ChargeResult),

    /// Another writer got in the way; the attempt changed nothing
    Contended,
}

/// One attempt at authorizing a charge
#[async_trait]
pub trait ChargeStrategy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Attempt to charge `amount` against the balance under `keys`
    ///
    /// A negative `amount` is rejected before anything is written.
    ///
    /// # Returns
    ///
    /// * `Ok(Attempt::Decided(result))` - the charge was authorized or declined
    /// * `Ok(Attempt::Contended)` - nothing was written; the caller may retry
    /// * `Err(ChargeError)` - the attempt failed and must not be retried blindly
    async fn attempt(
        &self,
        store: &dyn BalanceStore,
        keys: &AccountKeys,
        amount: i64,
    ) -> Result<Attempt, ChargeError>;
}

/// What to do with a balance given a requested amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Debit { new_balance: i64 },
    Decline,
}

impl Decision {
    /// Debit if the balance covers the amount, decline otherwise
    pub(crate) fn for_balance(balance: i64, amount: i64) -> Result<Self, ChargeError> {
        ensure_non_negative(amount)?;
        let new_balance = balance
            .checked_sub(amount)
            .ok_or_else(|| ChargeError::overflow(balance, amount))?;

        if new_balance >= 0 {
            Ok(Decision::Debit { new_balance })
        } else {
            Ok(Decision::Decline)
        }
    }
}

/// A charge can never credit the account
pub(crate) fn ensure_non_negative(amount: i64) -> Result<(), ChargeError> {
    if amount < 0 {
        return Err(ChargeError::NegativeAmount { amount });
    }
    Ok(())
}

/// A balance as read from the store, parsed and verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BalanceSnapshot {
    pub(crate) balance: i64,
    pub(crate) raw: String,
}

/// Read the balance under `key`, keeping the stored text for conditional writes
pub(crate) async fn read_snapshot(
    store: &dyn BalanceStore,
    key: &str,
) -> Result<BalanceSnapshot, ChargeError> {
    let raw = store
        .get(key)
        .await?
        .ok_or_else(|| ChargeError::missing_balance(key))?;
    let balance = parse_balance(key, &raw).map_err(|_| ChargeError::CorruptBalance {
        key: key.to_string(),
        value: raw.clone(),
    })?;
    Ok(BalanceSnapshot { balance, raw })
}

/// Read the balance under `key`, failing if it is missing or not a number
pub(crate) async fn read_balance(store: &dyn BalanceStore, key: &str) -> Result<i64, ChargeError> {
    read_snapshot(store, key).await.map(|snapshot| snapshot.balance)
}

/// Create a charge strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The strategy to create
/// * `config` - Authorizer configuration; the pessimistic strategy takes its
///   lock TTL from here
///
/// # Returns
///
/// A boxed trait object implementing the ChargeStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: &AuthorizerConfig,
) -> Box<dyn ChargeStrategy> {
    match strategy_type {
        StrategyType::Pessimistic => Box::new(PessimisticStrategy::new(config.lock_ttl)),
        StrategyType::Optimistic => Box::new(OptimisticStrategy),
        StrategyType::Naive => Box::new(NaiveStrategy),
        StrategyType::Decrement => Box::new(DecrementStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rstest::rstest;

    #[rstest]
    #[case::exact(100, 100, Decision::Debit { new_balance: 0 })]
    #[case::partial(100, 30, Decision::Debit { new_balance: 70 })]
    #[case::zero_amount(0, 0, Decision::Debit { new_balance: 0 })]
    #[case::short_by_one(30, 31, Decision::Decline)]
    #[case::already_negative(-5, 0, Decision::Decline)]
    fn test_decision(#[case] balance: i64, #[case] amount: i64, #[case] expected: Decision) {
        assert_eq!(Decision::for_balance(balance, amount).unwrap(), expected);
    }

    #[test]
    fn test_decision_overflow() {
        let result = Decision::for_balance(i64::MIN, 1);
        assert_eq!(result.unwrap_err(), ChargeError::overflow(i64::MIN, 1));
    }

    #[test]
    fn test_decision_rejects_negative_amount() {
        let result = Decision::for_balance(100, -50);
        assert_eq!(result.unwrap_err(), ChargeError::NegativeAmount { amount: -50 });
    }

    #[tokio::test]
    async fn test_read_snapshot_keeps_stored_text() {
        let store = MemoryStore::new();
        store.set("a/balance", "0100").await.unwrap();

        let snapshot = read_snapshot(&store, "a/balance").await.unwrap();
        assert_eq!(snapshot.balance, 100);
        assert_eq!(snapshot.raw, "0100");
    }

    #[tokio::test]
    async fn test_read_balance_missing() {
        let store = MemoryStore::new();
        let result = read_balance(&store, "a/balance").await;
        assert_eq!(result.unwrap_err(), ChargeError::missing_balance("a/balance"));
    }

    #[tokio::test]
    async fn test_read_balance_corrupt() {
        let store = MemoryStore::new();
        store.set("a/balance", "NaN").await.unwrap();

        let result = read_balance(&store, "a/balance").await;
        assert_eq!(
            result.unwrap_err(),
            ChargeError::CorruptBalance {
                key: "a/balance".to_string(),
                value: "NaN".to_string()
            }
        );
    }

    #[rstest]
    #[case::pessimistic(StrategyType::Pessimistic, "pessimistic")]
    #[case::optimistic(StrategyType::Optimistic, "optimistic")]
    #[case::naive(StrategyType::Naive, "naive")]
    #[case::decrement(StrategyType::Decrement, "decrement")]
    fn test_create_strategy(#[case] strategy_type: StrategyType, #[case] expected: &str) {
        let strategy = create_strategy(strategy_type, &AuthorizerConfig::default());
        assert_eq!(strategy.name(), expected);
    }

    #[rstest]
    #[case::pessimistic(StrategyType::Pessimistic)]
    #[case::optimistic(StrategyType::Optimistic)]
    #[case::naive(StrategyType::Naive)]
    #[case::decrement(StrategyType::Decrement)]
    #[tokio::test]
    async fn test_every_strategy_agrees_sequentially(#[case] strategy_type: StrategyType) {
        let store = MemoryStore::new();
        store.set("acct/balance", "100").await.unwrap();
        let keys = AccountKeys::for_account("acct");
        let strategy = create_strategy(strategy_type, &AuthorizerConfig::default());

        let mut results = Vec::new();
        for amount in [30, 40, 40] {
            match strategy.attempt(&store, &keys, amount).await.unwrap() {
                Attempt::Decided(result) => results.push(result),
                Attempt::Contended => panic!("no contention expected"),
            }
        }

        assert_eq!(
            results,
            vec![
                ChargeResult::authorized(70, 30),
                ChargeResult::authorized(30, 40),
                ChargeResult::insufficient_funds(30),
            ]
        );
        assert_eq!(store.get_balance("acct/balance").await.unwrap(), Some(30));
    }

    #[rstest]
    #[case::pessimistic(StrategyType::Pessimistic)]
    #[case::optimistic(StrategyType::Optimistic)]
    #[case::naive(StrategyType::Naive)]
    #[case::decrement(StrategyType::Decrement)]
    #[tokio::test]
    async fn test_every_strategy_rejects_negative_amount(#[case] strategy_type: StrategyType) {
        let store = MemoryStore::new();
        store.set("acct/balance", "100").await.unwrap();
        let keys = AccountKeys::for_account("acct");
        let strategy = create_strategy(strategy_type, &AuthorizerConfig::default());

        let result = strategy.attempt(&store, &keys, -50).await;

        assert_eq!(result.unwrap_err(), ChargeError::NegativeAmount { amount: -50 });
        assert_eq!(store.get_balance("acct/balance").await.unwrap(), Some(100));
        assert_eq!(store.get(&keys.lock).await.unwrap(), None);
    }
}
