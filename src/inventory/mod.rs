//! Inventory authority integration.
//!
//! # Data Flow
//! ```text
//! InventoryValidator::validate(request, deadline)
//!     → client.rs (InventoryAuthority::lookup, pooled HTTP)
//!     → types.rs (decode ProductRecord, extract versioned availability)
//!     → ValidationResult (checked / failed)
//! ```
//!
//! # Design Decisions
//! - Availability is read only from `inventory.schemaVersion = 1`
//! - One `reqwest::Client` for the process; no per-call connection setup
//! - Parse failures are InvalidResponse, never Timeout

pub mod client;
pub mod types;
pub mod validator;

pub use client::{ClientBuildError, HttpInventoryClient, InventoryAuthority};
pub use types::{InventoryLevel, LookupError, Money, ProductRecord, INVENTORY_SCHEMA_VERSION};
pub use validator::InventoryValidator;
