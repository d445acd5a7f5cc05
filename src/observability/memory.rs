//! In-memory telemetry sink.
//!
//! Keeps every record for later inspection. Intended for tests and for
//! embedders that forward telemetry on their own schedule.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::gate::types::ErrorKind;
use crate::observability::emitter::{TelemetryError, TelemetrySink};
use crate::observability::tracing::{AttemptResult, ValidationSpan};
use crate::resilience::CircuitState;

#[derive(Debug, Default)]
struct Records {
    spans: Vec<ValidationSpan>,
    durations: Vec<(AttemptResult, Duration)>,
    results: HashMap<AttemptResult, u64>,
    transitions: Vec<(CircuitState, CircuitState)>,
    degraded: Vec<ErrorKind>,
}

#[derive(Debug, Default)]
pub struct InMemorySink {
    records: Mutex<Records>,
}

impl InMemorySink {
    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn spans(&self) -> Vec<ValidationSpan> {
        self.lock().spans.clone()
    }

    pub fn last_span(&self) -> Option<ValidationSpan> {
        self.lock().spans.last().cloned()
    }

    /// Histogram observations in arrival order.
    pub fn durations(&self) -> Vec<(AttemptResult, Duration)> {
        self.lock().durations.clone()
    }

    pub fn result_count(&self, result: AttemptResult) -> u64 {
        self.lock().results.get(&result).copied().unwrap_or(0)
    }

    pub fn transitions(&self) -> Vec<(CircuitState, CircuitState)> {
        self.lock().transitions.clone()
    }

    pub fn degraded(&self) -> Vec<ErrorKind> {
        self.lock().degraded.clone()
    }
}

impl TelemetrySink for InMemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn record_span(&self, span: &ValidationSpan) -> Result<(), TelemetryError> {
        self.lock().spans.push(span.clone());
        Ok(())
    }

    fn observe_duration(
        &self,
        result: AttemptResult,
        duration: Duration,
    ) -> Result<(), TelemetryError> {
        self.lock().durations.push((result, duration));
        Ok(())
    }

    fn increment_result(&self, result: AttemptResult) -> Result<(), TelemetryError> {
        *self.lock().results.entry(result).or_insert(0) += 1;
        Ok(())
    }

    fn increment_transition(
        &self,
        from: CircuitState,
        to: CircuitState,
    ) -> Result<(), TelemetryError> {
        self.lock().transitions.push((from, to));
        Ok(())
    }

    fn increment_degraded(&self, error_kind: ErrorKind) -> Result<(), TelemetryError> {
        self.lock().degraded.push(error_kind);
        Ok(())
    }
}
