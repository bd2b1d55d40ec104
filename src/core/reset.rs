//! Account reset
//!
//! Reset is administrative: it overwrites the balance without taking the
//! account lock. A charge racing a reset may commit a debit against either
//! the old or the new balance.

use crate::store::BalanceStore;
use crate::types::{AccountKeys, StoreError};

/// Set the balance of `account` to `balance`, whatever it was before
///
/// # Errors
///
/// Returns the store error unchanged if the write fails.
pub async fn reset(
    store: &dyn BalanceStore,
    account: &str,
    balance: i64,
) -> Result<(), StoreError> {
    let keys = AccountKeys::for_account(account);
    store.set(&keys.balance, &balance.to_string()).await?;
    tracing::info!(account, balance, "account reset");
    Ok(())
}
