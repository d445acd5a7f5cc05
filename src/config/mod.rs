//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → policy shared via SharedPolicy to the orchestrator
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the ValidationPolicy
//!     → next validation call takes the new snapshot
//! ```
//!
//! # Design Decisions
//! - Policy is immutable per call; changes only land between calls
//! - All fields have defaults to allow minimal configs
//! - Only the policy reloads; clients and flag providers are built once

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FeatureFlagConfig, FlagProviderKind, GateConfig, InventoryConfig, LogFormat,
    ObservabilityConfig, ValidationPolicy,
};
pub use watcher::{PolicyWatcher, SharedPolicy};
