//! Circuit breakers for calls to unreliable external dependencies
//!
//! A breaker wraps one dependency (payment processor, email API, object
//! storage). Once the dependency keeps failing, calls fail fast with
//! [`CircuitOpenError`] instead of piling up against a dead service; after a
//! cooldown a few trial calls are let through to check for recovery.
//!
//! - **CircuitBreaker**: three-state breaker (Closed / Open / HalfOpen)
//! - **FailurePolicy**: decides which errors count against the circuit
//! - **CircuitBreakerRegistry**: named breakers for health endpoints and operator resets
//! - **DependencyGuard**: per-dependency wrapper that logs failures with breaker stats
//! - **Tower Layer**: the same protection for Tower services
//!
//! This is not a retry library: a rejected or failed call is returned to the
//! caller as-is.
//!
//! # Example: Payments with a shared registry
//!
//! ```rust,no_run
//! use circuit_breaker::{presets, CircuitBreakerError, CircuitBreakerRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(CircuitBreakerRegistry::new());
//!     let payments = registry.create(presets::payments_config()).unwrap();
//!
//!     let result = payments
//!         .execute(|| async {
//!             // Call the payment processor here
//!             Ok::<_, std::io::Error>(())
//!         })
//!         .await;
//!
//!     if let Err(CircuitBreakerError::Open(e)) = result {
//!         eprintln!("{} unavailable, try again later", e.circuit_name);
//!     }
//!
//!     // Admin health endpoint
//!     let body = registry.stats_json();
//!     println!("{}", body);
//! }
//! ```

pub mod breaker;
pub mod config;
pub mod dependency;
pub mod error;
pub mod layer;
pub mod metrics;
pub mod policy;
pub mod presets;
pub mod registry;
pub mod stats;

// Re-export main types for convenience
pub use breaker::{CircuitBreaker, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerSettings, FailurePolicyKind};
pub use dependency::DependencyGuard;
pub use error::{CircuitBreakerError, CircuitOpenError, ConfigError};
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
pub use policy::{ErrorClass, Failure, FailurePolicy};
pub use presets::{email_config, object_storage_config, payments_config};
pub use registry::CircuitBreakerRegistry;
pub use stats::CircuitBreakerStats;
