//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator / breaker produce:
//!     → emitter.rs (fan-out, errors swallowed)
//!         → tracing.rs (inventory.validate span fields)
//!         → metrics.rs (counters, histograms)
//!         → memory.rs (inspection in tests)
//!
//! Process setup:
//!     → logging.rs (tracing-subscriber, pretty or JSON)
//!     → metrics.rs (Prometheus scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - Telemetry is a side channel; it never blocks or fails a validation
//! - Correlation id from the caller flows onto every span
//! - Metrics are cheap (atomic increments behind the facade)

pub mod emitter;
pub mod logging;
pub mod memory;
pub mod metrics;
pub mod tracing;

use std::sync::Arc;

pub use emitter::{TelemetryEmitter, TelemetryError, TelemetrySink};
pub use memory::InMemorySink;
pub use self::metrics::MetricsSink;
pub use self::tracing::{AttemptResult, TracingSink, ValidationSpan};

/// Emitter wired to the production sinks.
pub fn default_emitter() -> TelemetryEmitter {
    TelemetryEmitter::new(vec![Arc::new(TracingSink), Arc::new(MetricsSink)])
}
