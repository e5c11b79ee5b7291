//! Circuit breaker configuration
//!
//! [`CircuitBreakerConfig`] is what a breaker is built from. It is validated
//! once, in [`CircuitBreaker::new`](crate::CircuitBreaker::new), so a bad
//! threshold fails at startup rather than on the first call.
//!
//! [`CircuitBreakerSettings`] is the serde-friendly form for service config
//! files and environment variables.

use crate::error::ConfigError;
use crate::policy::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::time::Duration;

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RESET_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_HALF_OPEN_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Unique name, used for logging and registry lookup
    pub name: String,
    /// Consecutive counted failures in Closed that trip the circuit
    pub failure_threshold: u32,
    /// Minimum time spent Open before a trial call is allowed
    pub reset_timeout: Duration,
    /// Trial calls admitted in HalfOpen before the circuit reopens
    pub half_open_max_attempts: u32,
    /// Which failures count toward `failure_threshold`
    pub failure_policy: FailurePolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: Duration::from_millis(DEFAULT_RESET_TIMEOUT_MS),
            half_open_max_attempts: DEFAULT_HALF_OPEN_MAX_ATTEMPTS,
            failure_policy: FailurePolicy::AlwaysCount,
        }
    }
}

impl CircuitBreakerConfig {
    /// Default settings under the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_failure_threshold(mut self, failure_threshold: u32) -> Self {
        self.failure_threshold = failure_threshold;
        self
    }

    pub fn with_reset_timeout(mut self, reset_timeout: Duration) -> Self {
        self.reset_timeout = reset_timeout;
        self
    }

    pub fn with_half_open_max_attempts(mut self, half_open_max_attempts: u32) -> Self {
        self.half_open_max_attempts = half_open_max_attempts;
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold(self.name.clone()));
        }
        if self.half_open_max_attempts == 0 {
            return Err(ConfigError::ZeroHalfOpenMaxAttempts(self.name.clone()));
        }
        Ok(())
    }
}

/// Named policies that can be selected from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyKind {
    #[default]
    AlwaysCount,
    ServerErrorsOnly,
}

impl From<FailurePolicyKind> for FailurePolicy {
    fn from(kind: FailurePolicyKind) -> Self {
        match kind {
            FailurePolicyKind::AlwaysCount => FailurePolicy::AlwaysCount,
            FailurePolicyKind::ServerErrorsOnly => FailurePolicy::ServerErrorsOnly,
        }
    }
}

impl std::str::FromStr for FailurePolicyKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always_count" | "always" => Ok(Self::AlwaysCount),
            "server_errors_only" | "server_errors" => Ok(Self::ServerErrorsOnly),
            _ => Err(()),
        }
    }
}

/// Serializable breaker settings
///
/// Missing fields fall back to the same defaults as [`CircuitBreakerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
    pub half_open_max_attempts: u32,
    pub failure_policy: FailurePolicyKind,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout_ms: DEFAULT_RESET_TIMEOUT_MS,
            half_open_max_attempts: DEFAULT_HALF_OPEN_MAX_ATTEMPTS,
            failure_policy: FailurePolicyKind::AlwaysCount,
        }
    }
}

impl CircuitBreakerSettings {
    /// Load settings for the breaker `name` from environment variables
    ///
    /// Environment variables (`<NAME>` is the upper-cased breaker name with
    /// `-` and `.` replaced by `_`):
    /// - `CIRCUIT_BREAKER_<NAME>_FAILURE_THRESHOLD`
    /// - `CIRCUIT_BREAKER_<NAME>_RESET_TIMEOUT_MS`
    /// - `CIRCUIT_BREAKER_<NAME>_HALF_OPEN_MAX_ATTEMPTS`
    /// - `CIRCUIT_BREAKER_<NAME>_FAILURE_POLICY` (`always_count` or `server_errors_only`)
    ///
    /// Unset variables keep their defaults; unparsable ones are an error.
    pub fn from_env(name: &str) -> Result<Self, ConfigError> {
        let prefix = env_prefix(name);
        let defaults = Self::default();

        Ok(Self {
            failure_threshold: env_or(&prefix, "FAILURE_THRESHOLD", defaults.failure_threshold)?,
            reset_timeout_ms: env_or(&prefix, "RESET_TIMEOUT_MS", defaults.reset_timeout_ms)?,
            half_open_max_attempts: env_or(
                &prefix,
                "HALF_OPEN_MAX_ATTEMPTS",
                defaults.half_open_max_attempts,
            )?,
            failure_policy: env_or(&prefix, "FAILURE_POLICY", defaults.failure_policy)?,
        })
    }

    /// Build a validated config for the breaker `name`
    pub fn into_config(self, name: impl Into<String>) -> Result<CircuitBreakerConfig, ConfigError> {
        let config = CircuitBreakerConfig {
            name: name.into(),
            failure_threshold: self.failure_threshold,
            reset_timeout: Duration::from_millis(self.reset_timeout_ms),
            half_open_max_attempts: self.half_open_max_attempts,
            failure_policy: self.failure_policy.into(),
        };
        config.validate()?;
        Ok(config)
    }
}

fn env_prefix(name: &str) -> String {
    let normalized: String = name
        .chars()
        .map(|c| match c {
            '-' | '.' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("CIRCUIT_BREAKER_{}", normalized)
}

fn env_or<T: std::str::FromStr>(prefix: &str, suffix: &str, default: T) -> Result<T, ConfigError> {
    let key = format!("{}_{}", prefix, suffix);
    match std::env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid_value(key, raw)),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(raw)) => {
            Err(ConfigError::invalid_value(key, raw.to_string_lossy()))
        }
    }
}
