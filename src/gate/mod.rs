//! Inventory validation gate.
//!
//! # Data Flow
//! ```text
//! cart-mutation handler
//!     → orchestrator.rs (ValidationOrchestrator::validate)
//!         → flags (validation on for this call?)
//!         → resilience (breaker admission, deadline)
//!         → inventory (lookup + classification)
//!         → policy.rs (pure decide: result + policy → verdict)
//!         → observability (span, histogram, counter)
//!     ← Verdict { Admit, RejectBusiness, RejectSystem }
//! ```
//!
//! # Design Decisions
//! - System errors never cross this boundary; only verdicts do
//! - Fail-open is the default branch, fail-closed a policy knob
//! - Every call owns exactly one validation attempt; no queueing

pub mod orchestrator;
pub mod policy;
pub mod types;

pub use orchestrator::{BuildError, Evaluation, ValidationOrchestrator};
pub use policy::{decide, GateRejection, InsufficientInventory, Verdict};
pub use types::{CallerContext, ErrorKind, RequestError, ValidationRequest, ValidationResult};
