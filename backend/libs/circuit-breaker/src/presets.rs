/// Preset breaker configurations for the external dependencies we call
///
/// All presets ignore caller errors (`FailurePolicy::ServerErrorsOnly`): a
/// declined card or a malformed address is not evidence the provider is down.
use crate::config::CircuitBreakerConfig;
use crate::policy::FailurePolicy;
use std::time::Duration;

/// Payment processor
///
/// - Circuit breaker: 5 failures, 60s cooldown
/// - Half-open: 1 trial (probing a payment API means charging someone)
pub fn payments_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        name: "payments".to_string(),
        failure_threshold: 5,
        reset_timeout: Duration::from_secs(60),
        half_open_max_attempts: 1,
        failure_policy: FailurePolicy::ServerErrorsOnly,
    }
}

/// Transactional email API
///
/// - Circuit breaker: 5 failures, 60s cooldown
/// - Half-open: 3 trials
pub fn email_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        name: "email".to_string(),
        failure_threshold: 5,
        reset_timeout: Duration::from_secs(60),
        half_open_max_attempts: 3,
        failure_policy: FailurePolicy::ServerErrorsOnly,
    }
}

/// S3/Object storage
///
/// - Circuit breaker: 3 failures, 30s cooldown
/// - Half-open: 2 trials
pub fn object_storage_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        name: "object-storage".to_string(),
        failure_threshold: 3,
        reset_timeout: Duration::from_secs(30),
        half_open_max_attempts: 2,
        failure_policy: FailurePolicy::ServerErrorsOnly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for config in [payments_config(), email_config(), object_storage_config()] {
            assert!(config.validate().is_ok(), "{} preset invalid", config.name);
            assert!(matches!(config.failure_policy, FailurePolicy::ServerErrorsOnly));
        }
    }

    #[test]
    fn test_payments_config() {
        let config = payments_config();
        assert_eq!(config.name, "payments");
        assert_eq!(config.reset_timeout, Duration::from_secs(60));
        assert_eq!(config.half_open_max_attempts, 1);
    }

    #[test]
    fn test_object_storage_config() {
        let config = object_storage_config();
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.reset_timeout, Duration::from_secs(30));
    }
}
