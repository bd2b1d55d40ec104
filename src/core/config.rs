//! Authorizer configuration
//!
//! Timing and retry parameters for the charge protocol. Zero values are
//! rejected with a warning and replaced by their defaults.

use std::time::Duration;

/// Starting balance written by `Reset`
pub const DEFAULT_BALANCE: i64 = 100;

/// Configuration for the charge authorizer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizerConfig {
    /// Expiry of a lock token; bounds how long a crashed holder blocks others
    pub lock_ttl: Duration,

    /// Fixed pause between attempts on a contended account
    pub retry_backoff: Duration,

    /// Maximum number of attempts per charge
    pub max_attempts: u32,

    /// Maximum wall time spent retrying a single charge
    pub max_wait: Duration,

    /// Balance written by `Reset`
    pub default_balance: i64,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_secs(1),
            retry_backoff: Duration::from_millis(10),
            max_attempts: 500,
            max_wait: Duration::from_secs(5),
            default_balance: DEFAULT_BALANCE,
        }
    }
}

impl AuthorizerConfig {
    /// Create a new AuthorizerConfig with custom values
    ///
    /// Any zero duration or zero attempt count falls back to the default and
    /// logs a warning. `default_balance` is taken as given.
    pub fn new(
        lock_ttl: Duration,
        retry_backoff: Duration,
        max_attempts: u32,
        max_wait: Duration,
        default_balance: i64,
    ) -> Self {
        let default = Self::default();

        Self {
            lock_ttl: non_zero_duration("lock_ttl", lock_ttl, default.lock_ttl),
            retry_backoff: non_zero_duration("retry_backoff", retry_backoff, default.retry_backoff),
            max_attempts: if max_attempts == 0 {
                tracing::warn!(
                    "Invalid max_attempts (0), using default ({})",
                    default.max_attempts
                );
                default.max_attempts
            } else {
                max_attempts
            },
            max_wait: non_zero_duration("max_wait", max_wait, default.max_wait),
            default_balance,
        }
    }
}

fn non_zero_duration(name: &str, value: Duration, default: Duration) -> Duration {
    if value.is_zero() {
        tracing::warn!("Invalid {} ({:?}), using default ({:?})", name, value, default);
        default
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = AuthorizerConfig::default();
        assert_eq!(config.lock_ttl, Duration::from_secs(1));
        assert_eq!(config.retry_backoff, Duration::from_millis(10));
        assert_eq!(config.default_balance, 100);
    }

    #[test]
    fn test_custom_values_are_kept() {
        let config = AuthorizerConfig::new(
            Duration::from_millis(250),
            Duration::from_millis(2),
            7,
            Duration::from_secs(1),
            0,
        );
        assert_eq!(config.lock_ttl, Duration::from_millis(250));
        assert_eq!(config.retry_backoff, Duration::from_millis(2));
        assert_eq!(config.max_attempts, 7);
        assert_eq!(config.max_wait, Duration::from_secs(1));
        assert_eq!(config.default_balance, 0);
    }

    #[rstest]
    #[case::zero_ttl(Duration::ZERO, Duration::from_millis(1), 1, Duration::from_secs(1))]
    #[case::zero_backoff(Duration::from_secs(1), Duration::ZERO, 1, Duration::from_secs(1))]
    #[case::zero_attempts(Duration::from_secs(1), Duration::from_millis(1), 0, Duration::from_secs(1))]
    #[case::zero_wait(Duration::from_secs(1), Duration::from_millis(1), 1, Duration::ZERO)]
    fn test_zero_values_fall_back_to_defaults(
        #[case] lock_ttl: Duration,
        #[case] retry_backoff: Duration,
        #[case] max_attempts: u32,
        #[case] max_wait: Duration,
    ) {
        let config = AuthorizerConfig::new(lock_ttl, retry_backoff, max_attempts, max_wait, 100);
        assert!(!config.lock_ttl.is_zero());
        assert!(!config.retry_backoff.is_zero());
        assert!(config.max_attempts > 0);
        assert!(!config.max_wait.is_zero());
    }
}
