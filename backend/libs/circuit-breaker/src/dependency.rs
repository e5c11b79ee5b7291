//! Per-dependency call wrapper
//!
//! Every protected dependency (payments, email, object storage, ...) gets one
//! [`DependencyGuard`]. Call sites go through the guard instead of the raw
//! breaker so that each failure is logged together with the breaker's stats.
//!
//! ```rust,no_run
//! use circuit_breaker::{presets, CircuitBreakerRegistry, DependencyGuard};
//!
//! # async fn charge(amount: u64) -> Result<String, std::io::Error> { Ok(String::new()) }
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = CircuitBreakerRegistry::new();
//! let payments = DependencyGuard::register(&registry, presets::payments_config())?;
//!
//! let receipt = payments.execute(|| charge(4200)).await?;
//! # Ok(())
//! # }
//! ```

use crate::breaker::CircuitBreaker;
use crate::config::CircuitBreakerConfig;
use crate::error::{CircuitBreakerError, ConfigError};
use crate::registry::CircuitBreakerRegistry;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Debug, Clone)]
pub struct DependencyGuard {
    breaker: Arc<CircuitBreaker>,
}

impl DependencyGuard {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self { breaker }
    }

    /// Build the dependency's breaker and add it to `registry`
    pub fn register(
        registry: &CircuitBreakerRegistry,
        config: CircuitBreakerConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(registry.create(config)?))
    }

    /// Run `operation` through the breaker, logging failures with breaker stats
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display + 'static,
    {
        let result = self.breaker.execute(operation).await;

        if let Err(e) = &result {
            let stats = self.breaker.stats();
            match e {
                CircuitBreakerError::Open(open) => {
                    warn!(
                        circuit = %open.circuit_name,
                        state = %stats.state,
                        failure_count = stats.failure_count,
                        total_attempts = stats.total_attempts,
                        "Dependency unavailable, call rejected"
                    );
                }
                CircuitBreakerError::Operation(err) => {
                    error!(
                        circuit = %self.breaker.name(),
                        error = %err,
                        state = %stats.state,
                        failure_count = stats.failure_count,
                        success_count = stats.success_count,
                        total_attempts = stats.total_attempts,
                        last_failure_time = ?stats.last_failure_time,
                        "Dependency call failed"
                    );
                }
            }
        }

        result
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn name(&self) -> &str {
        self.breaker.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breaker::CircuitState;
    use crate::presets;
    use http::StatusCode;

    #[tokio::test]
    async fn test_register_adds_to_registry() {
        let registry = CircuitBreakerRegistry::new();
        let guard = DependencyGuard::register(&registry, presets::email_config()).unwrap();

        assert_eq!(guard.name(), "email");
        assert!(Arc::ptr_eq(&registry.get("email").unwrap(), guard.breaker()));
    }

    #[tokio::test]
    async fn test_execute_passes_value_and_error_through() {
        let registry = CircuitBreakerRegistry::new();
        let guard = DependencyGuard::register(&registry, presets::payments_config()).unwrap();

        let value = guard
            .execute(|| async { Ok::<_, StatusCode>("ch_123") })
            .await
            .unwrap();
        assert_eq!(value, "ch_123");

        let err = guard
            .execute(|| async { Err::<(), _>(StatusCode::PAYMENT_REQUIRED) })
            .await
            .unwrap_err();
        assert_eq!(err.into_operation_error(), Some(StatusCode::PAYMENT_REQUIRED));

        // Declined cards are caller errors under the payments preset
        let stats = guard.breaker().stats();
        assert_eq!(stats.failure_count, 0);
        assert_eq!(stats.state, CircuitState::Closed);
        assert_eq!(stats.success_count, 1);
    }

    #[tokio::test]
    async fn test_execute_reports_rejection() {
        let registry = CircuitBreakerRegistry::new();
        let guard = DependencyGuard::register(
            &registry,
            CircuitBreakerConfig::named("object-storage").with_failure_threshold(1),
        )
        .unwrap();

        let _ = guard
            .execute(|| async { Err::<(), _>(StatusCode::SERVICE_UNAVAILABLE) })
            .await;
        let err = guard
            .execute(|| async { Ok::<_, StatusCode>(()) })
            .await
            .unwrap_err();

        assert!(err.is_open());
        assert_eq!(err.open_error().unwrap().circuit_name, "object-storage");
    }

    #[tokio::test]
    async fn test_execute_accepts_foreign_error_types() {
        let registry = CircuitBreakerRegistry::new();
        let guard = DependencyGuard::register(
            &registry,
            CircuitBreakerConfig::named("renderer").with_failure_threshold(1),
        )
        .unwrap();

        let err = guard
            .execute(|| async { Err::<(), _>(std::fmt::Error) })
            .await
            .unwrap_err();
        assert_eq!(err.into_operation_error(), Some(std::fmt::Error));
        assert_eq!(guard.breaker().state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_foreign_error_counts_under_server_errors_only() {
        let registry = CircuitBreakerRegistry::new();
        let guard = DependencyGuard::register(&registry, presets::payments_config()).unwrap();

        let _ = guard
            .execute(|| async { Err::<(), _>(std::fmt::Error) })
            .await;

        // No status information, so the dependency takes the blame
        assert_eq!(guard.breaker().stats().failure_count, 1);
    }
}
