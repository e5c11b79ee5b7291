//! Error types for circuit breaker operations

use crate::breaker::CircuitState;
use thiserror::Error;

/// A call was rejected before the protected operation ran
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circuit breaker '{circuit_name}' is {state} - failing fast")]
pub struct CircuitOpenError {
    pub circuit_name: String,
    pub state: CircuitState,
}

/// Outcome of a failed `execute` call
///
/// The breaker only ever originates [`CircuitBreakerError::Open`]. Anything
/// the protected operation returns comes back untouched in
/// [`CircuitBreakerError::Operation`].
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    #[error(transparent)]
    Open(#[from] CircuitOpenError),
    #[error("{0}")]
    Operation(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    pub fn open_error(&self) -> Option<&CircuitOpenError> {
        match self {
            Self::Open(e) => Some(e),
            Self::Operation(_) => None,
        }
    }

    /// The operation's own error, if it ran and failed
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Open(_) => None,
            Self::Operation(e) => Some(e),
        }
    }
}

/// Invalid breaker configuration, reported at construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Circuit breaker name must not be empty")]
    EmptyName,

    #[error("Circuit breaker '{0}': failure_threshold must be at least 1")]
    ZeroFailureThreshold(String),

    #[error("Circuit breaker '{0}': half_open_max_attempts must be at least 1")]
    ZeroHalfOpenMaxAttempts(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
