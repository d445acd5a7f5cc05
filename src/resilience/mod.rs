//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inventory lookup:
//!     → circuit_breaker.rs (admit, reject fast, or admit the single probe)
//!     → timeouts.rs (one deadline for every attempt)
//!     → On transient failure: retries.rs (retry once with backoff.rs delay)
//!     → outcome recorded back into circuit_breaker.rs
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every remote call has a deadline
//! - Circuit breaker prevents piling onto a failing authority
//! - None of these surface errors to the cart handler; the gate policy decides

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{
    Admission, BreakerPermit, BreakerSnapshot, CircuitBreaker, CircuitState, Transition,
};
pub use retries::RetryPlan;
pub use timeouts::{with_deadline, Deadline, DeadlineExceeded};
