/// Prometheus metrics for circuit breakers
#[cfg(feature = "metrics")]
use prometheus::{register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec};

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;

#[cfg(feature = "metrics")]
static CIRCUIT_BREAKER_STATE_TRANSITIONS: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    register_int_counter_vec!(
        "circuit_breaker_state_transitions_total",
        "Total number of circuit breaker state transitions",
        &["circuit", "from", "to"]
    )
    .map_err(|e| tracing::error!(error = %e, "Failed to register state transitions metric"))
    .ok()
});

#[cfg(feature = "metrics")]
static CIRCUIT_BREAKER_CALLS: Lazy<Option<IntCounterVec>> = Lazy::new(|| {
    register_int_counter_vec!(
        "circuit_breaker_calls_total",
        "Total number of calls through circuit breakers, by outcome",
        &["circuit", "result"]
    )
    .map_err(|e| tracing::error!(error = %e, "Failed to register calls metric"))
    .ok()
});

#[cfg(feature = "metrics")]
static CIRCUIT_BREAKER_OPEN_DURATION: Lazy<Option<HistogramVec>> = Lazy::new(|| {
    register_histogram_vec!(
        "circuit_breaker_open_duration_seconds",
        "Duration a circuit breaker remained open",
        &["circuit"],
        vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 900.0]
    )
    .map_err(|e| tracing::error!(error = %e, "Failed to register open duration metric"))
    .ok()
});

/// Metrics collector for circuit breaker
///
/// `result` is one of `success`, `failure`, `ignored` (failure not counted by
/// the policy) or `rejected` (failed fast).
#[cfg(feature = "metrics")]
pub struct CircuitBreakerMetrics;

#[cfg(feature = "metrics")]
impl CircuitBreakerMetrics {
    pub fn record_state_transition(circuit: &str, from: &str, to: &str) {
        if let Some(counter) = CIRCUIT_BREAKER_STATE_TRANSITIONS.as_ref() {
            counter.with_label_values(&[circuit, from, to]).inc();
        }
    }

    pub fn record_call(circuit: &str, result: &str) {
        if let Some(counter) = CIRCUIT_BREAKER_CALLS.as_ref() {
            counter.with_label_values(&[circuit, result]).inc();
        }
    }

    pub fn record_open_duration(circuit: &str, duration_secs: f64) {
        if let Some(histogram) = CIRCUIT_BREAKER_OPEN_DURATION.as_ref() {
            histogram.with_label_values(&[circuit]).observe(duration_secs);
        }
    }
}

// No-op implementation when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub struct CircuitBreakerMetrics;

#[cfg(not(feature = "metrics"))]
impl CircuitBreakerMetrics {
    pub fn record_state_transition(_circuit: &str, _from: &str, _to: &str) {}
    pub fn record_call(_circuit: &str, _result: &str) {}
    pub fn record_open_duration(_circuit: &str, _duration_secs: f64) {}
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;

    #[test]
    fn test_calls_are_counted_per_circuit() {
        CircuitBreakerMetrics::record_call("metrics-test", "rejected");
        CircuitBreakerMetrics::record_call("metrics-test", "rejected");

        let counter = CIRCUIT_BREAKER_CALLS.as_ref().unwrap();
        assert_eq!(
            counter.with_label_values(&["metrics-test", "rejected"]).get(),
            2
        );
    }
}
