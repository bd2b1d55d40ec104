//! Balance store adapters
//!
//! The `BalanceStore` trait is the only way the authorizer touches shared
//! state. Every method is a single round trip against the backend; there is
//! no caching and no retrying at this layer. Retry policy belongs to callers.
//!
//! # Backends
//!
//! - [`MemoryStore`] - in-process map with TTL support, for tests and local runs
//! - [`RedisStore`] - Redis shared by every process instance

use std::time::Duration;

use async_trait::async_trait;

use crate::types::StoreError;

pub mod memory;
pub mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Key-value operations the authorizer needs from the shared store
///
/// Values are strings; balances are stored as base-10 integers. All
/// conditional operations must be atomic with respect to other callers of the
/// same backend, including callers in other processes.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Read the value under `key`, or `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally overwrite `key`, clearing any TTL
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Write `key` with a time-to-live only if it is currently absent
    ///
    /// Returns `true` if the value was written.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Remove `key`; removing an absent key is not an error
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Remove `key` only if it currently holds `expected`
    ///
    /// Returns `true` if the key was removed.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// Replace the value under `key` with `new` only if it currently holds `expected`
    ///
    /// Returns `true` if the value was replaced.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError>;

    /// Atomically add `delta` to the integer under `key` and return the result
    ///
    /// An absent key counts as 0. A non-integer value is
    /// `StoreError::NotAnInteger`; a result outside `i64` is
    /// `StoreError::OutOfRange`.
    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError>;

    /// Read `key` as an integer balance
    async fn get_balance(&self, key: &str) -> Result<Option<i64>, StoreError> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => parse_balance(key, &raw).map(Some),
        }
    }
}

/// Parse a stored balance, tolerating surrounding whitespace
pub fn parse_balance(key: &str, raw: &str) -> Result<i64, StoreError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| StoreError::not_an_integer(key, raw))
}
