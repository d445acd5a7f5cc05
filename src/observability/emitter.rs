//! Telemetry fan-out.
//!
//! The emitter hands every validation attempt and breaker transition to a
//! list of sinks. A failing sink is logged and skipped; nothing here can
//! fail the calling validation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::gate::types::ErrorKind;
use crate::observability::tracing::{AttemptResult, ValidationSpan};
use crate::resilience::CircuitState;

/// A sink could not accept a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("telemetry sink {sink} failed: {message}")]
pub struct TelemetryError {
    pub sink: &'static str,
    pub message: String,
}

impl TelemetryError {
    pub fn new(sink: &'static str, message: impl Into<String>) -> Self {
        Self {
            sink,
            message: message.into(),
        }
    }
}

/// Destination for validation telemetry. Methods default to no-ops so a
/// sink implements only what it carries.
pub trait TelemetrySink: Send + Sync {
    fn name(&self) -> &'static str;

    fn record_span(&self, _span: &ValidationSpan) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn observe_duration(
        &self,
        _result: AttemptResult,
        _duration: Duration,
    ) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn increment_result(&self, _result: AttemptResult) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn increment_transition(
        &self,
        _from: CircuitState,
        _to: CircuitState,
    ) -> Result<(), TelemetryError> {
        Ok(())
    }

    fn increment_degraded(&self, _error_kind: ErrorKind) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Cheap-to-clone handle over the configured sinks.
#[derive(Clone)]
pub struct TelemetryEmitter {
    sinks: Arc<[Arc<dyn TelemetrySink>]>,
}

impl TelemetryEmitter {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self {
            sinks: sinks.into(),
        }
    }

    /// Emitter with no sinks.
    pub fn disabled() -> Self {
        Self::new(Vec::new())
    }

    /// One span, one histogram observation and one counter increment.
    pub fn emit_attempt(&self, span: &ValidationSpan) {
        for sink in self.sinks.iter() {
            swallow(sink.name(), sink.record_span(span));
            swallow(sink.name(), sink.observe_duration(span.result, span.duration));
            swallow(sink.name(), sink.increment_result(span.result));
        }
    }

    pub fn emit_transition(&self, from: CircuitState, to: CircuitState) {
        for sink in self.sinks.iter() {
            swallow(sink.name(), sink.increment_transition(from, to));
        }
    }

    pub fn emit_degraded(&self, error_kind: ErrorKind) {
        for sink in self.sinks.iter() {
            swallow(sink.name(), sink.increment_degraded(error_kind));
        }
    }
}

impl fmt::Debug for TelemetryEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.sinks.iter().map(|s| s.name()).collect();
        f.debug_struct("TelemetryEmitter").field("sinks", &names).finish()
    }
}

fn swallow(sink: &'static str, result: Result<(), TelemetryError>) {
    if let Err(e) = result {
        tracing::warn!(sink, error = %e, "Dropping telemetry record");
    }
}
