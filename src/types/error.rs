//! Error types for the charge authorizer
//!
//! Two layers of errors exist:
//!
//! - **`StoreError`**: the shared key-value store could not be reached, or held
//!   a value that is not what the operation required
//! - **`ChargeError`**: everything that can stop a charge from reaching a
//!   decision, including store errors
//!
//! `Reset` surfaces `StoreError` to its caller. `Charge` never surfaces an error;
//! the authorizer maps every `ChargeError` to a declined result.

use thiserror::Error;

/// Failure talking to the shared store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Transport or protocol error; the operation may or may not have applied
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of the underlying failure
        message: String,
    },

    /// A key expected to hold an integer holds something else
    #[error("Value '{value}' under key '{key}' is not an integer")]
    NotAnInteger {
        /// The offending key
        key: String,
        /// The raw stored value
        value: String,
    },

    /// An atomic add would leave the integer range
    #[error("Incrementing '{key}' by {delta} is out of range")]
    OutOfRange {
        /// The key being incremented
        key: String,
        /// The rejected delta
        delta: i64,
    },
}

impl From<redis::RedisError> for StoreError {
    fn from(error: redis::RedisError) -> Self {
        StoreError::Unavailable {
            message: error.to_string(),
        }
    }
}

impl StoreError {
    /// Create an Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }

    /// Create a NotAnInteger error
    pub fn not_an_integer(key: &str, value: &str) -> Self {
        StoreError::NotAnInteger {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an OutOfRange error
    pub fn out_of_range(key: &str, delta: i64) -> Self {
        StoreError::OutOfRange {
            key: key.to_string(),
            delta,
        }
    }
}

/// Failure that prevents a charge from being decided
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChargeError {
    /// The store failed during acquisition, read, or write
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The balance key is absent; the account was never reset
    #[error("No balance stored under '{key}'")]
    MissingBalance {
        /// The balance key that was read
        key: String,
    },

    /// The balance key holds a non-numeric value
    #[error("Corrupt balance under '{key}': '{value}'")]
    CorruptBalance {
        /// The balance key that was read
        key: String,
        /// The raw stored value
        value: String,
    },

    /// Charges must be non-negative
    #[error("Charge amount must be non-negative, got {amount}")]
    NegativeAmount {
        /// The rejected amount
        amount: i64,
    },

    /// `balance - amount` does not fit in an i64
    #[error("Arithmetic overflow charging {amount} against balance {balance}")]
    Overflow {
        /// Balance observed at decision time
        balance: i64,
        /// Requested amount
        amount: i64,
    },

    /// Exclusion could not be obtained within the retry budget
    #[error("Account still contended after {attempts} attempts")]
    Contended {
        /// Number of attempts made before giving up
        attempts: u32,
    },
}

impl ChargeError {
    /// Create a MissingBalance error
    pub fn missing_balance(key: &str) -> Self {
        ChargeError::MissingBalance {
            key: key.to_string(),
        }
    }

    /// Create an Overflow error
    pub fn overflow(balance: i64, amount: i64) -> Self {
        ChargeError::Overflow { balance, amount }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unavailable(
        ChargeError::Store(StoreError::unavailable("connection refused")),
        "Store unavailable: connection refused"
    )]
    #[case::not_an_integer(
        ChargeError::Store(StoreError::not_an_integer("a/balance", "abc")),
        "Value 'abc' under key 'a/balance' is not an integer"
    )]
    #[case::out_of_range(
        ChargeError::Store(StoreError::out_of_range("a/balance", -1)),
        "Incrementing 'a/balance' by -1 is out of range"
    )]
    #[case::missing_balance(
        ChargeError::missing_balance("a/balance"),
        "No balance stored under 'a/balance'"
    )]
    #[case::corrupt_balance(
        ChargeError::CorruptBalance { key: "a/balance".to_string(), value: "x".to_string() },
        "Corrupt balance under 'a/balance': 'x'"
    )]
    #[case::negative_amount(
        ChargeError::NegativeAmount { amount: -5 },
        "Charge amount must be non-negative, got -5"
    )]
    #[case::overflow(
        ChargeError::overflow(i64::MIN, 1),
        "Arithmetic overflow charging 1 against balance -9223372036854775808"
    )]
    #[case::contended(
        ChargeError::Contended { attempts: 50 },
        "Account still contended after 50 attempts"
    )]
    fn test_error_display(#[case] error: ChargeError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_store_error_conversion() {
        let error: ChargeError = StoreError::unavailable("timeout").into();
        assert!(matches!(error, ChargeError::Store(StoreError::Unavailable { .. })));
    }

    #[test]
    fn test_redis_error_conversion() {
        let redis_error = redis::RedisError::from((redis::ErrorKind::IoError, "broken pipe"));
        let error: StoreError = redis_error.into();
        assert!(matches!(error, StoreError::Unavailable { .. }));
        assert!(error.to_string().contains("broken pipe"));
    }
}
