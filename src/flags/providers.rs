//! Flag provider implementations.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::flags::{EvaluationContext, FlagError, FlagProvider};

/// Serves one fixed value for every flag.
#[derive(Debug, Clone, Copy)]
pub struct StaticFlagProvider {
    enabled: bool,
}

impl StaticFlagProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl FlagProvider for StaticFlagProvider {
    async fn evaluate(
        &self,
        _flag_key: &str,
        _context: &EvaluationContext,
    ) -> Result<bool, FlagError> {
        Ok(self.enabled)
    }
}

const RESOLVE_BOOLEAN_PATH: &str = "/flagd.evaluation.v1.Service/ResolveBoolean";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest<'a> {
    flag_key: &'a str,
    context: &'a EvaluationContext,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    value: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    variant: Option<String>,
}

/// flagd evaluation over its HTTP/JSON interface.
#[derive(Debug, Clone)]
pub struct FlagdProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl FlagdProvider {
    /// One long-lived client; connections are pooled across evaluations.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, FlagError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| FlagError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), RESOLVE_BOOLEAN_PATH),
        })
    }
}

#[async_trait]
impl FlagProvider for FlagdProvider {
    async fn evaluate(
        &self,
        flag_key: &str,
        context: &EvaluationContext,
    ) -> Result<bool, FlagError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ResolveRequest { flag_key, context })
            .send()
            .await
            .map_err(|e| FlagError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FlagError::Status(status.as_u16()));
        }

        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| FlagError::Malformed(e.to_string()))?;

        tracing::trace!(
            flag = flag_key,
            value = body.value,
            reason = body.reason.as_deref().unwrap_or("unknown"),
            variant = body.variant.as_deref().unwrap_or("unknown"),
            "flagd resolved flag"
        );
        Ok(body.value)
    }
}
