//! Distributed lock built on the shared store
//!
//! A lock is a key written with `set_if_absent` and a TTL. Its value is a
//! token unique to one acquisition: the acquisition timestamp followed by a
//! random nonce. Release is a compare-and-delete on that token, so a holder
//! whose lock already expired can never remove a newer holder's lock.
//!
//! # Guarantees
//!
//! - At most one live token exists per lock name
//! - A crashed holder blocks others for at most the TTL
//! - Exclusion is only as good as the TTL: a holder that overruns it loses the
//!   lock silently and learns so at release time

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::store::BalanceStore;
use crate::types::StoreError;

/// Proof of a successful acquisition
///
/// Consumed by [`DistributedLock::release`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a held lock must be released"]
pub struct LockToken {
    name: String,
    value: String,
    acquired_at: DateTime<Utc>,
}

impl LockToken {
    fn new(name: &str, acquired_at: DateTime<Utc>) -> Self {
        let value = format!(
            "{}|{}",
            acquired_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Uuid::new_v4()
        );
        Self {
            name: name.to_owned(),
            value,
            acquired_at,
        }
    }

    /// The lock key this token was written under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stored token value
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }
}

/// Named mutual exclusion with expiry
#[derive(Clone, Copy)]
pub struct DistributedLock<'a> {
    store: &'a dyn BalanceStore,
    ttl: Duration,
}

impl<'a> DistributedLock<'a> {
    /// Create a lock handle over `store` whose tokens expire after `ttl`
    pub fn new(store: &'a dyn BalanceStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Try once to acquire the lock `name`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(token))` - the lock is held until released or expired
    /// * `Ok(None)` - another holder (or a stale, unexpired token) exists
    /// * `Err(StoreError)` - the store could not be reached
    pub async fn acquire(&self, name: &str) -> Result<Option<LockToken>, StoreError> {
        let token = LockToken::new(name, Utc::now());

        if self
            .store
            .set_if_absent(name, token.value(), self.ttl)
            .await?
        {
            tracing::debug!(lock = name, "lock acquired");
            Ok(Some(token))
        } else {
            tracing::debug!(lock = name, "lock busy");
            Ok(None)
        }
    }

    /// Release a previously acquired lock
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - the token was still current and has been removed
    /// * `Ok(false)` - the token had expired; whatever is stored now belongs
    ///   to someone else and was left untouched
    pub async fn release(&self, token: LockToken) -> Result<bool, StoreError> {
        let released = self
            .store
            .compare_and_delete(token.name(), token.value())
            .await?;

        if !released {
            tracing::warn!(
                lock = token.name(),
                acquired_at = %token.acquired_at(),
                ttl = ?self.ttl,
                "lock expired before release"
            );
        }
        Ok(released)
    }
}
