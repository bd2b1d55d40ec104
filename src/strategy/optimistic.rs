//! Optimistic concurrency strategy
//!
//! Reads the balance without any lock and commits with a compare-and-swap
//! against the value it read. If another writer changed the balance in
//! between, the swap misses and the attempt reports contention; the
//! authorizer retries with a fresh read.

use async_trait::async_trait;

use super::{read_snapshot, Attempt, ChargeStrategy, Decision};
use crate::store::BalanceStore;
use crate::types::{AccountKeys, ChargeError, ChargeResult};

/// Read, decide, compare-and-swap
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimisticStrategy;

#[async_trait]
impl ChargeStrategy for OptimisticStrategy {
    fn name(&self) -> &'static str {
        "optimistic"
    }

    async fn attempt(
        &self,
        store: &dyn BalanceStore,
        keys: &AccountKeys,
        amount: i64,
    ) -> Result<Attempt, ChargeError> {
        let snapshot = read_snapshot(store, &keys.balance).await?;
        let balance = snapshot.balance;

        match Decision::for_balance(balance, amount)? {
            Decision::Debit { new_balance } => {
                // Compare against the stored text; "0100" parses to 100 but is not "100"
                let swapped = store
                    .compare_and_swap(&keys.balance, &snapshot.raw, &new_balance.to_string())
                    .await?;
                if swapped {
                    Ok(Attempt::Decided(ChargeResult::authorized(new_balance, amount)))
                } else {
                    Ok(Attempt::Contended)
                }
            }
            // Declining writes nothing, so there is nothing to validate
            Decision::Decline => Ok(Attempt::Decided(ChargeResult::insufficient_funds(balance))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rstest::rstest;
    use std::time::Duration;

    /// Store whose balance changes between the read and the swap
    #[derive(Debug)]
    struct InterferingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl BalanceStore for InterferingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, crate::types::StoreError> {
            let value = self.inner.get(key).await?;
            self.inner.incr_by(key, -1).await?;
            Ok(value)
        }
        async fn set(&self, key: &str, value: &str) -> Result<(), crate::types::StoreError> {
            self.inner.set(key, value).await
        }
        async fn set_if_absent(
            &self,
            key: &str,
            value: &str,
            ttl: Duration,
        ) -> Result<bool, crate::types::StoreError> {
            self.inner.set_if_absent(key, value, ttl).await
        }
        async fn delete(&self, key: &str) -> Result<(), crate::types::StoreError> {
            self.inner.delete(key).await
        }
        async fn compare_and_delete(
            &self,
            key: &str,
            expected: &str,
        ) -> Result<bool, crate::types::StoreError> {
            self.inner.compare_and_delete(key, expected).await
        }
        async fn compare_and_swap(
            &self,
            key: &str,
            expected: &str,
            new: &str,
        ) -> Result<bool, crate::types::StoreError> {
            self.inner.compare_and_swap(key, expected, new).await
        }
        async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, crate::types::StoreError> {
            self.inner.incr_by(key, delta).await
        }
    }

    #[tokio::test]
    async fn test_swap_miss_reports_contention() {
        let store = InterferingStore {
            inner: MemoryStore::new(),
        };
        store.inner.set("acct/balance", "100").await.unwrap();
        let keys = AccountKeys::for_account("acct");

        let attempt = OptimisticStrategy.attempt(&store, &keys, 10).await.unwrap();

        assert_eq!(attempt, Attempt::Contended);
        assert_eq!(store.inner.get_balance("acct/balance").await.unwrap(), Some(99));
    }

    #[tokio::test]
    async fn test_uncontended_debit() {
        let store = MemoryStore::new();
        store.set("acct/balance", "100").await.unwrap();
        let keys = AccountKeys::for_account("acct");

        let attempt = OptimisticStrategy.attempt(&store, &keys, 100).await.unwrap();

        assert_eq!(attempt, Attempt::Decided(ChargeResult::authorized(0, 100)));
    }

    #[rstest]
    #[case::leading_zero("0100")]
    #[case::padded(" 100 ")]
    #[case::plus_sign("+100")]
    #[tokio::test]
    async fn test_non_canonical_balance_is_debited(#[case] stored: &str) {
        let store = MemoryStore::new();
        store.set("acct/balance", stored).await.unwrap();
        let keys = AccountKeys::for_account("acct");

        let attempt = OptimisticStrategy.attempt(&store, &keys, 10).await.unwrap();

        assert_eq!(attempt, Attempt::Decided(ChargeResult::authorized(90, 10)));
        assert_eq!(store.get("acct/balance").await.unwrap().as_deref(), Some("90"));
    }

    #[tokio::test]
    async fn test_never_takes_a_lock() {
        let store = MemoryStore::new();
        store.set("acct/balance", "100").await.unwrap();
        let keys = AccountKeys::for_account("acct");
        store
            .set_if_absent(&keys.lock, "someone", Duration::from_secs(60))
            .await
            .unwrap();

        let attempt = OptimisticStrategy.attempt(&store, &keys, 10).await.unwrap();

        assert_eq!(attempt, Attempt::Decided(ChargeResult::authorized(90, 10)));
    }
}
