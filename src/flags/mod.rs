//! Feature flag gating.
//!
//! # Data Flow
//! ```text
//! orchestrator
//!     → FeatureGate::is_enabled (bounded by evaluation timeout)
//!     → FlagProvider::evaluate (static or flagd over HTTP)
//!     → bool, or the safe default (disabled) on any failure
//! ```
//!
//! # Design Decisions
//! - The gate never errors and never blocks past its evaluation timeout
//! - Evaluated state is logged for observability only

pub mod providers;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::config::{FeatureFlagConfig, FlagProviderKind};
use crate::gate::types::ValidationRequest;

pub use providers::{FlagdProvider, StaticFlagProvider};

/// Failures of a flag provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("flag provider unreachable: {0}")]
    Transport(String),

    #[error("flag provider returned HTTP {0}")]
    Status(u16),

    #[error("malformed flag evaluation: {0}")]
    Malformed(String),

    /// The selected provider is missing a required setting.
    #[error("flag provider not configured: {0} is required")]
    NotConfigured(&'static str),
}

/// Targeting attributes sent with an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EvaluationContext(BTreeMap<String, String>);

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Context derived from a validation request and its caller.
    pub fn from_request(request: &ValidationRequest) -> Self {
        let caller = request.caller();
        let mut ctx = Self::new()
            .with("targetingKey", caller.correlation_id.to_string())
            .with("productId", request.product_id());
        if let Some(user) = &caller.user_id {
            ctx = ctx.with("targetingKey", user.clone()).with("userId", user.clone());
        }
        for (key, value) in &caller.attributes {
            ctx.0.entry(key.clone()).or_insert_with(|| value.clone());
        }
        ctx
    }
}

/// Source of flag values.
#[async_trait]
pub trait FlagProvider: Send + Sync {
    async fn evaluate(
        &self,
        flag_key: &str,
        context: &EvaluationContext,
    ) -> Result<bool, FlagError>;
}

/// Resolves whether validation is active for a call.
#[derive(Clone)]
pub struct FeatureGate {
    provider: Arc<dyn FlagProvider>,
    flag_key: String,
    timeout: Duration,
}

impl FeatureGate {
    pub fn new(
        provider: Arc<dyn FlagProvider>,
        flag_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            flag_key: flag_key.into(),
            timeout,
        }
    }

    /// Gate backed by the provider named in config.
    pub fn from_config(config: &FeatureFlagConfig) -> Result<Self, FlagError> {
        let provider: Arc<dyn FlagProvider> = match config.provider {
            FlagProviderKind::Static => Arc::new(StaticFlagProvider::new(config.static_enabled)),
            FlagProviderKind::Flagd => {
                let url = config
                    .flagd_url
                    .as_deref()
                    .ok_or(FlagError::NotConfigured("feature_flag.flagd_url"))?;
                Arc::new(FlagdProvider::new(url, config.evaluation_timeout())?)
            }
        };
        Ok(Self::new(
            provider,
            config.flag_key.clone(),
            config.evaluation_timeout(),
        ))
    }

    pub fn flag_key(&self) -> &str {
        &self.flag_key
    }

    /// Evaluate `flag_key`; any failure or timeout yields `false`.
    pub async fn is_enabled(&self, flag_key: &str, context: &EvaluationContext) -> bool {
        let evaluation = self.provider.evaluate(flag_key, context);
        let enabled = match tokio::time::timeout(self.timeout, evaluation).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(
                    flag = flag_key,
                    error = %e,
                    "Flag evaluation failed, using default"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    flag = flag_key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Flag evaluation timed out, using default"
                );
                false
            }
        };
        tracing::debug!(flag = flag_key, enabled, "Feature flag evaluated");
        enabled
    }

    /// Whether inventory validation is on for this request.
    pub async fn validation_enabled(&self, request: &ValidationRequest) -> bool {
        let context = EvaluationContext::from_request(request);
        self.is_enabled(&self.flag_key, &context).await
    }
}

impl std::fmt::Debug for FeatureGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureGate")
            .field("flag_key", &self.flag_key)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::types::CallerContext;

    struct FailingProvider;

    #[async_trait]
    impl FlagProvider for FailingProvider {
        async fn evaluate(&self, _key: &str, _ctx: &EvaluationContext) -> Result<bool, FlagError> {
            Err(FlagError::Transport("connection refused".into()))
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl FlagProvider for HangingProvider {
        async fn evaluate(&self, _key: &str, _ctx: &EvaluationContext) -> Result<bool, FlagError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_static_provider() {
        let gate = FeatureGate::new(
            Arc::new(StaticFlagProvider::new(true)),
            "f",
            Duration::from_millis(50),
        );
        assert!(gate.is_enabled("f", &EvaluationContext::new()).await);
    }

    #[tokio::test]
    async fn test_provider_error_defaults_to_disabled() {
        let gate = FeatureGate::new(Arc::new(FailingProvider), "f", Duration::from_millis(50));
        assert!(!gate.is_enabled("f", &EvaluationContext::new()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_defaults_to_disabled() {
        let gate = FeatureGate::new(Arc::new(HangingProvider), "f", Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        assert!(!gate.is_enabled("f", &EvaluationContext::new()).await);
        assert_eq!(started.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn test_flagd_without_url_is_not_configured() {
        let config = FeatureFlagConfig {
            provider: FlagProviderKind::Flagd,
            flagd_url: None,
            ..FeatureFlagConfig::default()
        };
        assert_eq!(
            FeatureGate::from_config(&config).unwrap_err(),
            FlagError::NotConfigured("feature_flag.flagd_url")
        );
    }

    #[test]
    fn test_context_from_request() {
        let caller = CallerContext::new().with_user("u-42").with_attribute("region", "eu");
        let request = ValidationRequest::new("P1", 1, caller).unwrap();
        let ctx = EvaluationContext::from_request(&request);

        assert_eq!(ctx.get("targetingKey"), Some("u-42"));
        assert_eq!(ctx.get("userId"), Some("u-42"));
        assert_eq!(ctx.get("productId"), Some("P1"));
        assert_eq!(ctx.get("region"), Some("eu"));
    }
}
