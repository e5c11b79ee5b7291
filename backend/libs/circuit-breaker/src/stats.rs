//! Monitoring snapshot of a single breaker

use crate::breaker::CircuitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable copy of a breaker's counters
///
/// Serialized with camelCase keys for the admin health endpoint. Renaming a
/// field breaks dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    /// Consecutive counted failures since the last success or reset
    pub failure_count: u32,
    pub success_count: u64,
    /// Every call to `execute`, rejected ones included
    pub total_attempts: u64,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
}

impl CircuitBreakerStats {
    pub fn is_closed(&self) -> bool {
        self.state == CircuitState::Closed
    }
}
