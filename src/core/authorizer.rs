//! Charge authorization
//!
//! `ChargeAuthorizer` is the entry point callers use. It owns the shared
//! store handle, the selected strategy, and the retry policy.
//!
//! # Design
//!
//! A charge runs as a loop of strategy attempts:
//!
//! 1. Derive the balance and lock keys from the account
//! 2. Run one attempt of the strategy
//! 3. On contention, sleep a fixed backoff and try again, until either the
//!    attempt budget or the wall-time budget is spent
//! 4. On exhaustion, give up with `ChargeError::Contended`
//!
//! `try_charge` returns errors as they are. `charge` is fail-closed: every
//! error becomes a declined `ChargeResult` whose `outcome` names the cause,
//! so no error ever crosses the charge boundary and no ambiguity ever turns
//! into an authorized charge.
//!
//! # Fairness
//!
//! Waiting requests are not queued. Whichever retry finds the account free
//! first wins.

use std::sync::Arc;

use tokio::time::Instant;

use super::config::AuthorizerConfig;
use super::reset::reset;
use crate::store::BalanceStore;
use crate::strategy::{Attempt, ChargeStrategy, PessimisticStrategy};
use crate::types::{AccountKeys, ChargeError, ChargeResult, StoreError};

/// Authorizes charges against balances held in a shared store
///
/// Holds no balance state of its own; any number of authorizers, in any
/// number of processes, may share one store.
pub struct ChargeAuthorizer {
    store: Arc<dyn BalanceStore>,
    strategy: Box<dyn ChargeStrategy>,
    config: AuthorizerConfig,
}

impl std::fmt::Debug for ChargeAuthorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChargeAuthorizer")
            .field("strategy", &self.strategy.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ChargeAuthorizer {
    /// Create an authorizer using pessimistic locking
    ///
    /// # Arguments
    ///
    /// * `store` - Shared store holding balances and lock tokens
    /// * `config` - Lock TTL, retry policy, and default balance
    pub fn new(store: Arc<dyn BalanceStore>, config: AuthorizerConfig) -> Self {
        let strategy = Box::new(PessimisticStrategy::new(config.lock_ttl));
        Self::with_strategy(store, strategy, config)
    }

    /// Create an authorizer with an explicit strategy
    pub fn with_strategy(
        store: Arc<dyn BalanceStore>,
        strategy: Box<dyn ChargeStrategy>,
        config: AuthorizerConfig,
    ) -> Self {
        Self {
            store,
            strategy,
            config,
        }
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Set the account's balance to the configured default
    ///
    /// Bypasses the lock. Store failures are returned unchanged.
    pub async fn reset(&self, account: &str) -> Result<(), StoreError> {
        reset(self.store.as_ref(), account, self.config.default_balance).await
    }

    /// Charge `amount` against `account`, never failing
    ///
    /// Errors are logged and mapped to a declined result:
    /// - contention past the retry budget -> `ChargeOutcome::Contended`
    /// - anything else -> `ChargeOutcome::Error`
    ///
    /// In both cases `is_authorized` is false, `charges` is 0, and
    /// `remaining_balance` is 0.
    pub async fn charge(&self, account: &str, amount: i64) -> ChargeResult {
        match self.try_charge(account, amount).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(account, amount, error = %e, "charge declined");
                ChargeResult::from(&e)
            }
        }
    }

    /// Charge `amount` against `account`, returning errors to the caller
    ///
    /// # Returns
    ///
    /// * `Ok(result)` - the charge was authorized or declined for insufficient funds
    /// * `Err(ChargeError::NegativeAmount)` - `amount` is negative
    /// * `Err(ChargeError::Contended)` - the retry budget ran out
    /// * `Err(ChargeError::MissingBalance | CorruptBalance)` - the account holds no usable balance
    /// * `Err(ChargeError::Store)` - the store failed
    pub async fn try_charge(&self, account: &str, amount: i64) -> Result<ChargeResult, ChargeError> {
        if amount < 0 {
            return Err(ChargeError::NegativeAmount { amount });
        }

        let keys = AccountKeys::for_account(account);
        let deadline = Instant::now() + self.config.max_wait;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            if let Attempt::Decided(result) = self
                .strategy
                .attempt(self.store.as_ref(), &keys, amount)
                .await?
            {
                tracing::info!(
                    account,
                    amount,
                    attempts,
                    strategy = self.strategy.name(),
                    authorized = result.is_authorized,
                    remaining_balance = result.remaining_balance,
                    "charge decided"
                );
                return Ok(result);
            }

            let next_attempt_at = Instant::now() + self.config.retry_backoff;
            if attempts >= self.config.max_attempts || next_attempt_at > deadline {
                return Err(ChargeError::Contended { attempts });
            }

            tracing::debug!(account, attempts, "account contended, backing off");
            tokio::time::sleep(self.config.retry_backoff).await;
        }
    }
}
