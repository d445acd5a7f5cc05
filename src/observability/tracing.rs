//! Validation spans.
//!
//! # Responsibilities
//! - Open one `inventory.validate` span per orchestrator call
//! - Carry the attempt record (product, quantities, result, circuit state)
//! - Record the final fields onto the span when the attempt completes

use std::fmt;
use std::time::Duration;

use tracing::field::Empty;
use tracing::Span;
use uuid::Uuid;

use crate::gate::types::{ErrorKind, ValidationRequest, ValidationResult};
use crate::observability::emitter::{TelemetryError, TelemetrySink};
use crate::resilience::CircuitState;

/// Result label shared by spans, histograms and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttemptResult {
    Success,
    Insufficient,
    Error,
    Bypassed,
}

impl AttemptResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptResult::Success => "success",
            AttemptResult::Insufficient => "insufficient",
            AttemptResult::Error => "error",
            AttemptResult::Bypassed => "bypassed",
        }
    }

    pub fn classify(result: &ValidationResult) -> Self {
        if !result.validation_performed() {
            return AttemptResult::Bypassed;
        }
        match result.error_kind() {
            None => AttemptResult::Success,
            Some(ErrorKind::InsufficientInventory) => AttemptResult::Insufficient,
            Some(_) => AttemptResult::Error,
        }
    }
}

impl fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything recorded about one validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSpan {
    pub product_id: String,
    pub requested_quantity: u32,
    pub available_quantity: Option<u32>,
    pub result: AttemptResult,
    pub error_kind: Option<ErrorKind>,
    pub duration: Duration,
    /// Breaker state when the call arrived.
    pub circuit_state: CircuitState,
    pub correlation_id: Uuid,
    pub degraded: bool,
}

impl ValidationSpan {
    pub fn new(
        request: &ValidationRequest,
        result: &ValidationResult,
        circuit_state: CircuitState,
        degraded: bool,
    ) -> Self {
        Self {
            product_id: request.product_id().to_string(),
            requested_quantity: request.requested_quantity(),
            available_quantity: result.available_quantity(),
            result: AttemptResult::classify(result),
            error_kind: result.error_kind(),
            duration: result.duration(),
            circuit_state,
            correlation_id: request.caller().correlation_id,
            degraded,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// Span covering one orchestrator call. Outcome fields start empty.
pub fn validation_span(request: &ValidationRequest, circuit_state: CircuitState) -> Span {
    tracing::info_span!(
        "inventory.validate",
        product_id = %request.product_id(),
        requested_quantity = request.requested_quantity(),
        correlation_id = %request.caller().correlation_id,
        circuit_state = %circuit_state,
        available_quantity = Empty,
        result = Empty,
        error_kind = Empty,
        duration_ms = Empty,
        degraded = Empty,
    )
}

/// Records attempts onto the current `inventory.validate` span.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn record_span(&self, record: &ValidationSpan) -> Result<(), TelemetryError> {
        let span = Span::current();
        if let Some(available) = record.available_quantity {
            span.record("available_quantity", available);
        }
        if let Some(kind) = record.error_kind {
            span.record("error_kind", kind.as_str());
        }
        span.record("result", record.result.as_str());
        span.record("duration_ms", record.duration_ms());
        span.record("degraded", record.degraded);

        tracing::debug!(
            result = %record.result,
            duration_ms = record.duration_ms(),
            "Inventory validation attempt finished"
        );
        Ok(())
    }
}
