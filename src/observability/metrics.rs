//! Metrics collection and exposition.
//!
//! # Metrics
//! - `inventory_gate_validations_total` (counter): attempts by result
//! - `inventory_gate_validation_duration_seconds` (histogram): attempt latency by result
//! - `inventory_gate_circuit_transitions_total` (counter): breaker moves by from/to
//! - `inventory_gate_degraded_total` (counter): fail-open admissions by error kind
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Histogram buckets tuned around the default 500ms deadline

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};

use crate::gate::types::ErrorKind;
use crate::observability::emitter::{TelemetryError, TelemetrySink};
use crate::observability::tracing::AttemptResult;
use crate::resilience::CircuitState;

pub const VALIDATIONS_TOTAL: &str = "inventory_gate_validations_total";
pub const VALIDATION_DURATION: &str = "inventory_gate_validation_duration_seconds";
pub const CIRCUIT_TRANSITIONS_TOTAL: &str = "inventory_gate_circuit_transitions_total";
pub const DEGRADED_TOTAL: &str = "inventory_gate_degraded_total";

const DURATION_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5,
];

/// Install the Prometheus recorder with a scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(Matcher::Full(VALIDATION_DURATION.to_string()), DURATION_BUCKETS)?
        .install()?;

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Sink recording through the `metrics` facade.
#[derive(Debug, Default)]
pub struct MetricsSink;

impl TelemetrySink for MetricsSink {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn observe_duration(
        &self,
        result: AttemptResult,
        duration: Duration,
    ) -> Result<(), TelemetryError> {
        metrics::histogram!(VALIDATION_DURATION, "result" => result.as_str())
            .record(duration.as_secs_f64());
        Ok(())
    }

    fn increment_result(&self, result: AttemptResult) -> Result<(), TelemetryError> {
        metrics::counter!(VALIDATIONS_TOTAL, "result" => result.as_str()).increment(1);
        Ok(())
    }

    fn increment_transition(
        &self,
        from: CircuitState,
        to: CircuitState,
    ) -> Result<(), TelemetryError> {
        metrics::counter!(
            CIRCUIT_TRANSITIONS_TOTAL,
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
        Ok(())
    }

    fn increment_degraded(&self, error_kind: ErrorKind) -> Result<(), TelemetryError> {
        metrics::counter!(DEGRADED_TOTAL, "error" => error_kind.as_str()).increment(1);
        Ok(())
    }
}
