//! Account-related types for the charge authorizer
//!
//! An account is identified by an opaque string. Everything the authorizer
//! persists for an account lives under two keys derived from that string.

/// Suffix appended to the account identifier to form the balance key
const BALANCE_SUFFIX: &str = "/balance";

/// Prefix prepended to the balance key to form the lock key
const LOCK_PREFIX: &str = "resource_lock_";

/// Store keys belonging to a single account
///
/// Both keys are derived deterministically from the account identifier, so
/// every process instance sharing the store agrees on them without any
/// coordination.
///
/// ```text
/// account         -> "acct-42"
/// balance key     -> "acct-42/balance"
/// lock key        -> "resource_lock_acct-42/balance"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKeys {
    /// Key holding the balance as an integer-as-string
    pub balance: String,

    /// Key holding the lock token (timestamp and nonce) with a TTL
    pub lock: String,
}

impl AccountKeys {
    /// Derive the balance and lock keys for an account
    pub fn for_account(account: &str) -> Self {
        let balance = format!("{account}{BALANCE_SUFFIX}");
        let lock = format!("{LOCK_PREFIX}{balance}");
        Self { balance, lock }
    }
}
