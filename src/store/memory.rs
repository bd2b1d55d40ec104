//! In-process balance store
//!
//! `MemoryStore` implements `BalanceStore` on top of `DashMap`. Conditional
//! operations run while holding the shard lock for the key, which makes them
//! atomic with respect to every other task sharing the same `MemoryStore`.
//!
//! Expiry is lazy: an entry past its deadline is treated as absent by every
//! read and replaced by every conditional write.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::BalanceStore;
use crate::types::StoreError;

/// A stored value and its optional expiry deadline
#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn persistent(value: String) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn expiring(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Some(Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// The value if the entry is still live
    fn live(&self) -> Option<&str> {
        if self.is_expired() {
            None
        } else {
            Some(&self.value)
        }
    }
}

/// Thread-safe in-memory key-value store with per-key TTL
///
/// Clones of an `Arc<MemoryStore>` behave like separate clients of one shared
/// store, which is what the concurrency tests rely on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.value().is_expired())
            .count()
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .entries
            .get(key)
            .and_then(|entry| entry.value().live().map(str::to_owned));
        if value.is_none() {
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .insert(key.to_owned(), StoredValue::persistent(value.to_owned()));
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let fresh = StoredValue::expiring(value.to_owned(), ttl);
        let mut inserted = false;
        let mut slot = self.entries.entry(key.to_owned()).or_insert_with(|| {
            inserted = true;
            fresh.clone()
        });

        if inserted {
            return Ok(true);
        }
        if slot.value().is_expired() {
            *slot.value_mut() = fresh;
            return Ok(true);
        }
        Ok(false)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.live() == Some(expected));
        Ok(removed.is_some())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.value().live() == Some(expected) => {
                *entry.value_mut() = StoredValue::persistent(new.to_owned());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn incr_by(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| StoredValue::persistent("0".to_owned()));

        let current = match entry.value().live() {
            None => 0,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| StoreError::not_an_integer(key, raw))?,
        };
        let updated = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::out_of_range(key, delta))?;

        let expires_at = entry.value().expires_at.filter(|_| !entry.value().is_expired());
        *entry.value_mut() = StoredValue {
            value: updated.to_string(),
            expires_at,
        };
        Ok(updated)
    }
}
