//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! requirements. Every problem is reported, not just the first.

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{FlagProviderKind, GateConfig, ValidationPolicy};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a full configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = policy_errors(&config.policy);

    match Url::parse(&config.inventory.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "inventory.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("inventory.base_url", e.to_string())),
    }

    if !config.inventory.product_path.contains("{id}") {
        errors.push(ValidationError::new(
            "inventory.product_path",
            "must contain the {id} placeholder",
        ));
    }

    if config.feature_flag.flag_key.trim().is_empty() {
        errors.push(ValidationError::new("feature_flag.flag_key", "must not be empty"));
    }

    if config.feature_flag.evaluation_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "feature_flag.evaluation_timeout_ms",
            "must be greater than zero",
        ));
    }

    if config.feature_flag.provider == FlagProviderKind::Flagd {
        match config.feature_flag.flagd_url.as_deref().map(Url::parse) {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                errors.push(ValidationError::new("feature_flag.flagd_url", e.to_string()))
            }
            None => errors.push(ValidationError::new(
                "feature_flag.flagd_url",
                "required when provider = \"flagd\"",
            )),
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the decision policy. Used again on hot reload.
pub fn validate_policy(policy: &ValidationPolicy) -> Result<(), Vec<ValidationError>> {
    let errors = policy_errors(policy);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn policy_errors(policy: &ValidationPolicy) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if policy.timeout_ms == 0 {
        errors.push(ValidationError::new("policy.timeout_ms", "must be greater than zero"));
    }
    if policy.failure_threshold == 0 {
        errors.push(ValidationError::new("policy.failure_threshold", "must be at least 1"));
    }
    if policy.sampling_window_ms == 0 {
        errors.push(ValidationError::new(
            "policy.sampling_window_ms",
            "must be greater than zero",
        ));
    }
    if policy.minimum_throughput == 0 {
        errors.push(ValidationError::new("policy.minimum_throughput", "must be at least 1"));
    }
    if policy.break_duration_ms == 0 {
        errors.push(ValidationError::new(
            "policy.break_duration_ms",
            "must be greater than zero",
        ));
    }
    errors
}
