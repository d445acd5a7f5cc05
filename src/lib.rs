//! Resilient inventory-validation gate for cart mutations.

pub mod config;
pub mod flags;
pub mod gate;
pub mod inventory;
pub mod observability;
pub mod resilience;

pub use config::{GateConfig, SharedPolicy, ValidationPolicy};
pub use gate::{GateRejection, ValidationOrchestrator, ValidationRequest, Verdict};
