/// Circuit breaker with consecutive-failure tripping and bounded half-open probing
///
/// State transitions:
/// - Closed → Open: when consecutive counted failures reach `failure_threshold`
/// - Open → HalfOpen: on the first call after `reset_timeout` has elapsed
/// - HalfOpen → Closed: when a trial call succeeds
/// - HalfOpen → Open: when a trial call fails, or when `half_open_max_attempts`
///   trials were admitted without settling the question
///
/// Recovery is lazy. There is no timer; an Open breaker that sees no traffic
/// stays Open.
use crate::config::CircuitBreakerConfig;
use crate::error::{CircuitBreakerError, CircuitOpenError, ConfigError};
use crate::metrics::CircuitBreakerMetrics;
use crate::stats::CircuitBreakerStats;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Normal operation, requests pass through
    Closed,
    /// Circuit is open, requests fail fast
    Open,
    /// Testing if the dependency recovered, limited requests allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: RwLock<CircuitBreakerState>,
}

struct CircuitBreakerState {
    current: CircuitState,
    failure_count: u32,
    success_count: u64,
    total_attempts: u64,
    half_open_attempts: u32,
    /// Monotonic reference point for `reset_timeout`
    last_failure_at: Option<Instant>,
    last_failure_time: Option<DateTime<Utc>>,
    last_success_time: Option<DateTime<Utc>>,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            state: RwLock::new(CircuitBreakerState {
                current: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                total_attempts: 0,
                half_open_attempts: 0,
                last_failure_at: None,
                last_failure_time: None,
                last_success_time: None,
                opened_at: None,
            }),
        })
    }

    /// Execute an operation with circuit breaker protection
    ///
    /// The configured [`FailurePolicy`](crate::FailurePolicy) decides whether a
    /// failure counts against the circuit. The operation's own result is
    /// always handed back unchanged.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display + 'static,
    {
        let policy = &self.config.failure_policy;
        self.run(operation, |error: &E| policy.should_count(error)).await
    }

    /// Like [`execute`](Self::execute), but `should_count` replaces the
    /// configured failure policy for this call
    pub async fn execute_with_classifier<F, Fut, T, E, C>(
        &self,
        operation: F,
        should_count: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        C: FnOnce(&E) -> bool,
    {
        self.run(operation, should_count).await
    }

    async fn run<F, Fut, T, E, C>(
        &self,
        operation: F,
        should_count: C,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        C: FnOnce(&E) -> bool,
    {
        self.admit()?;

        // Lock is not held while the dependency is being called
        match operation().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => {
                if should_count(&error) {
                    self.record_failure(&error);
                } else {
                    self.record_ignored_failure(&error);
                }
                Err(CircuitBreakerError::Operation(error))
            }
        }
    }

    /// Admission check, run before the operation is invoked
    fn admit(&self) -> Result<(), CircuitOpenError> {
        let mut state = self.state.write();
        state.total_attempts += 1;

        if state.current == CircuitState::Open {
            let elapsed = state.last_failure_at.map(|at| at.elapsed());
            match elapsed {
                Some(elapsed) if elapsed < self.config.reset_timeout => {
                    debug!(
                        circuit = %self.config.name,
                        remaining_ms = (self.config.reset_timeout - elapsed).as_millis() as u64,
                        "Circuit breaker open, rejecting call"
                    );
                    CircuitBreakerMetrics::record_call(&self.config.name, "rejected");
                    return Err(self.open_error(state.current));
                }
                _ => {
                    info!(circuit = %self.config.name, "Circuit breaker: Open → HalfOpen");
                    self.transition(&mut state, CircuitState::HalfOpen);
                    state.half_open_attempts = 0;
                }
            }
        }

        if state.current == CircuitState::HalfOpen {
            if state.half_open_attempts >= self.config.half_open_max_attempts {
                warn!(
                    circuit = %self.config.name,
                    attempts = state.half_open_attempts,
                    "Circuit breaker: HalfOpen → Open (trial attempts exhausted)"
                );
                self.transition(&mut state, CircuitState::Open);
                // Re-arm the reset clock so the next trial waits a full timeout
                state.last_failure_at = Some(Instant::now());
                state.last_failure_time = Some(Utc::now());
                state.half_open_attempts = 0;
                CircuitBreakerMetrics::record_call(&self.config.name, "rejected");
                return Err(self.open_error(state.current));
            }
            state.half_open_attempts += 1;
        }

        Ok(())
    }

    fn record_success(&self) {
        let mut state = self.state.write();

        state.success_count += 1;
        state.last_success_time = Some(Utc::now());
        CircuitBreakerMetrics::record_call(&self.config.name, "success");

        match state.current {
            CircuitState::HalfOpen => {
                info!(circuit = %self.config.name, "Circuit breaker: HalfOpen → Closed");
                self.transition(&mut state, CircuitState::Closed);
                state.failure_count = 0;
                state.half_open_attempts = 0;
            }
            CircuitState::Closed => {
                state.failure_count = 0;
            }
            CircuitState::Open => {
                // A trial admitted before the circuit reopened; nothing to do
            }
        }
    }

    fn record_failure<E: fmt::Display>(&self, error: &E) {
        let mut state = self.state.write();

        state.failure_count += 1;
        state.last_failure_at = Some(Instant::now());
        state.last_failure_time = Some(Utc::now());
        CircuitBreakerMetrics::record_call(&self.config.name, "failure");

        match state.current {
            CircuitState::Closed => {
                if state.failure_count >= self.config.failure_threshold {
                    warn!(
                        circuit = %self.config.name,
                        failures = state.failure_count,
                        error = %error,
                        "Circuit breaker: Closed → Open"
                    );
                    self.transition(&mut state, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                warn!(
                    circuit = %self.config.name,
                    error = %error,
                    "Circuit breaker: HalfOpen → Open (trial failed)"
                );
                self.transition(&mut state, CircuitState::Open);
                state.half_open_attempts = 0;
            }
            CircuitState::Open => {
                // Already open
            }
        }
    }

    fn record_ignored_failure<E: fmt::Display>(&self, error: &E) {
        debug!(
            circuit = %self.config.name,
            error = %error,
            "Failure not counted against circuit"
        );
        CircuitBreakerMetrics::record_call(&self.config.name, "ignored");
    }

    fn transition(&self, state: &mut CircuitBreakerState, to: CircuitState) {
        let from = state.current;
        if from == to {
            return;
        }

        if from == CircuitState::Open {
            if let Some(opened_at) = state.opened_at.take() {
                CircuitBreakerMetrics::record_open_duration(
                    &self.config.name,
                    opened_at.elapsed().as_secs_f64(),
                );
            }
        }
        if to == CircuitState::Open {
            state.opened_at = Some(Instant::now());
        }

        CircuitBreakerMetrics::record_state_transition(
            &self.config.name,
            from.as_str(),
            to.as_str(),
        );
        state.current = to;
    }

    fn open_error(&self, state: CircuitState) -> CircuitOpenError {
        CircuitOpenError {
            circuit_name: self.config.name.clone(),
            state,
        }
    }

    /// Force the circuit closed (manual operator override)
    ///
    /// Success and attempt totals are diagnostic and survive a reset.
    pub fn reset(&self) {
        let mut state = self.state.write();

        if state.current != CircuitState::Closed {
            info!(
                circuit = %self.config.name,
                from = %state.current,
                "Circuit breaker manually reset to Closed"
            );
        }
        self.transition(&mut state, CircuitState::Closed);
        state.opened_at = None;
        state.failure_count = 0;
        state.half_open_attempts = 0;
        state.last_failure_at = None;
        state.last_failure_time = None;
    }

    /// Point-in-time snapshot for monitoring
    pub fn stats(&self) -> CircuitBreakerStats {
        let state = self.state.read();
        CircuitBreakerStats {
            state: state.current,
            failure_count: state.failure_count,
            success_count: state.success_count,
            total_attempts: state.total_attempts,
            last_failure_time: state.last_failure_time,
            last_success_time: state.last_success_time,
        }
    }

    /// Get current circuit state (for monitoring)
    ///
    /// Does not perform the lazy Open → HalfOpen check.
    pub fn state(&self) -> CircuitState {
        self.state.read().current
    }

    /// Trial calls admitted since entering HalfOpen
    pub fn half_open_attempts(&self) -> u32 {
        self.state.read().half_open_attempts
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.config.name)
            .field("state", &self.state())
            .finish()
    }
}
