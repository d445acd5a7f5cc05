//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the inventory gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Decision policy (timeouts, breaker thresholds, fail-open).
    pub policy: ValidationPolicy,

    /// Inventory authority connection settings.
    pub inventory: InventoryConfig,

    /// Feature flag gating.
    pub feature_flag: FeatureFlagConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Policy consulted on every validation attempt.
///
/// Read-only at call time: the orchestrator takes one snapshot per call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationPolicy {
    /// Deadline for the whole remote lookup, retries included.
    pub timeout_ms: u64,

    /// Failures inside the sampling window that open the circuit.
    pub failure_threshold: u32,

    /// Sliding window over which outcomes are counted.
    pub sampling_window_ms: u64,

    /// Minimum outcomes inside the window before the circuit may open.
    pub minimum_throughput: u32,

    /// How long the circuit stays open before admitting a probe.
    pub break_duration_ms: u64,

    /// Admit the mutation when validation itself fails.
    pub fail_open: bool,

    /// Extra attempts for transient lookup failures.
    pub max_retries: u32,

    /// Base delay between transient retries.
    pub retry_backoff_ms: u64,
}

impl ValidationPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sampling_window(&self) -> Duration {
        Duration::from_millis(self.sampling_window_ms)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_millis(self.break_duration_ms)
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 500,
            failure_threshold: 5,
            sampling_window_ms: 30_000,
            minimum_throughput: 5,
            break_duration_ms: 30_000,
            fail_open: true,
            max_retries: 1,
            retry_backoff_ms: 25,
        }
    }
}

/// Inventory authority (product catalog) client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Base URL of the product service (e.g., "http://product-catalog:8080").
    /// A path prefix such as "http://gateway/catalog" is kept.
    pub base_url: String,

    /// Lookup path appended to `base_url`; `{id}` is replaced with the
    /// path-segment encoded product id.
    pub product_path: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// How long idle pooled connections are kept.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3550".to_string(),
            product_path: "/api/products/{id}".to_string(),
            connect_timeout_ms: 250,
            pool_idle_timeout_secs: 90,
            pool_max_idle_per_host: 32,
        }
    }
}

/// Which flag provider backs the feature gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagProviderKind {
    /// Fixed value from `static_enabled`.
    Static,
    /// OpenFeature flagd evaluation over HTTP.
    Flagd,
}

/// Feature flag configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureFlagConfig {
    /// Flag key that turns validation on.
    pub flag_key: String,

    pub provider: FlagProviderKind,

    /// Value served by the static provider.
    pub static_enabled: bool,

    /// flagd evaluation endpoint (e.g., "http://flagd:8013").
    pub flagd_url: Option<String>,

    /// Upper bound on a single flag evaluation.
    pub evaluation_timeout_ms: u64,
}

impl FeatureFlagConfig {
    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluation_timeout_ms)
    }
}

impl Default for FeatureFlagConfig {
    fn default() -> Self {
        Self {
            flag_key: "cartInventoryValidation".to_string(),
            provider: FlagProviderKind::Static,
            static_enabled: true,
            flagd_url: None,
            evaluation_timeout_ms: 100,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// JSON for production, pretty for development.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
