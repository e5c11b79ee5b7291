//! Named collection of circuit breakers
//!
//! The registry only indexes breakers for monitoring and operator actions.
//! Each subsystem keeps its own `Arc<CircuitBreaker>` and calls through it
//! directly; lookups by name are for the admin surface.
//!
//! There is no global instance. Build one at startup and share it (usually
//! as `Arc<CircuitBreakerRegistry>`) with whatever needs it.

use crate::breaker::{CircuitBreaker, CircuitState};
use crate::config::CircuitBreakerConfig;
use crate::error::ConfigError;
use crate::stats::CircuitBreakerStats;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breaker under `name`
    ///
    /// An existing entry with the same name is replaced and returned.
    pub fn register(
        &self,
        name: impl Into<String>,
        breaker: Arc<CircuitBreaker>,
    ) -> Option<Arc<CircuitBreaker>> {
        let name = name.into();
        let previous = self.breakers.write().insert(name.clone(), breaker);

        if previous.is_some() {
            warn!(circuit = %name, "Circuit breaker re-registered, replacing previous instance");
        } else {
            info!(circuit = %name, "Circuit breaker registered");
        }
        previous
    }

    /// Register a breaker under its configured name
    pub fn register_breaker(&self, breaker: Arc<CircuitBreaker>) -> Option<Arc<CircuitBreaker>> {
        let name = breaker.name().to_string();
        self.register(name, breaker)
    }

    /// Build a breaker from `config`, register it, and hand it back
    pub fn create(&self, config: CircuitBreakerConfig) -> Result<Arc<CircuitBreaker>, ConfigError> {
        let breaker = Arc::new(CircuitBreaker::new(config)?);
        self.register_breaker(breaker.clone());
        Ok(breaker)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.read().get(name).cloned()
    }

    /// Stats for every registered breaker, keyed by name
    ///
    /// Each entry is consistent on its own; the map as a whole is not a
    /// single atomic snapshot.
    pub fn get_all_stats(&self) -> BTreeMap<String, CircuitBreakerStats> {
        self.entries()
            .into_iter()
            .map(|(name, breaker)| (name, breaker.stats()))
            .collect()
    }

    /// Force every registered breaker closed
    pub fn reset_all(&self) {
        let entries = self.entries();
        warn!(count = entries.len(), "Resetting all circuit breakers");

        for (_, breaker) in entries {
            breaker.reset();
        }
    }

    /// Current state of each breaker, sorted by name
    pub fn health_status(&self) -> Vec<(String, CircuitState)> {
        let mut status: Vec<_> = self
            .entries()
            .into_iter()
            .map(|(name, breaker)| (name, breaker.state()))
            .collect();
        status.sort_by(|a, b| a.0.cmp(&b.0));
        status
    }

    /// True when no registered breaker is Open or HalfOpen
    pub fn all_closed(&self) -> bool {
        self.entries()
            .iter()
            .all(|(_, breaker)| breaker.state() == CircuitState::Closed)
    }

    /// `get_all_stats` rendered for a JSON health endpoint
    pub fn stats_json(&self) -> serde_json::Value {
        serde_json::to_value(self.get_all_stats()).unwrap_or(serde_json::Value::Null)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.breakers.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.read().is_empty()
    }

    // Breakers are touched only after the map lock is released
    fn entries(&self) -> Vec<(String, Arc<CircuitBreaker>)> {
        self.breakers
            .read()
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.clone()))
            .collect()
    }
}

impl std::fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("breakers", &self.names())
            .finish()
    }
}
