//! Validation orchestrator.
//!
//! # Responsibilities
//! - Run FeatureGate → CircuitBreaker → InventoryValidator → decide
//! - Record the lookup outcome into the breaker before returning
//! - Emit telemetry for every call, bypasses included
//!
//! The call completes before the verdict is returned; the cart handler
//! mutates the store only after awaiting it.

use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;

use crate::config::{GateConfig, SharedPolicy};
use crate::flags::{FeatureGate, FlagError};
use crate::gate::policy::{decide, Verdict};
use crate::gate::types::{ValidationRequest, ValidationResult};
use crate::inventory::{
    ClientBuildError, HttpInventoryClient, InventoryAuthority, InventoryValidator,
};
use crate::observability::{self, tracing::validation_span, TelemetryEmitter, ValidationSpan};
use crate::resilience::{Admission, CircuitBreaker, Deadline};

/// Components could not be built from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("inventory client: {0}")]
    Inventory(#[from] ClientBuildError),

    #[error("feature flag provider: {0}")]
    FeatureFlag(#[from] FlagError),
}

/// Verdict together with the result it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub result: ValidationResult,
}

/// Entry point for the cart-mutation path.
#[derive(Debug)]
pub struct ValidationOrchestrator {
    gate: FeatureGate,
    breaker: Arc<CircuitBreaker>,
    validator: InventoryValidator,
    telemetry: TelemetryEmitter,
    policy: SharedPolicy,
}

impl ValidationOrchestrator {
    pub fn new(
        gate: FeatureGate,
        authority: Arc<dyn InventoryAuthority>,
        telemetry: TelemetryEmitter,
        policy: SharedPolicy,
    ) -> Self {
        Self {
            gate,
            breaker: Arc::new(CircuitBreaker::new(telemetry.clone())),
            validator: InventoryValidator::new(authority),
            telemetry,
            policy,
        }
    }

    /// Production wiring: HTTP inventory client, configured flag provider,
    /// tracing + metrics sinks.
    pub fn from_config(config: &GateConfig, policy: SharedPolicy) -> Result<Self, BuildError> {
        let authority = Arc::new(HttpInventoryClient::new(&config.inventory)?);
        let gate = FeatureGate::from_config(&config.feature_flag)?;
        Ok(Self::new(gate, authority, observability::default_emitter(), policy))
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn policy(&self) -> &SharedPolicy {
        &self.policy
    }

    /// Validate one cart mutation and return only the verdict.
    pub async fn validate(&self, request: &ValidationRequest) -> Verdict {
        self.evaluate(request).await.verdict
    }

    /// Validate one cart mutation, keeping the underlying result.
    pub async fn evaluate(&self, request: &ValidationRequest) -> Evaluation {
        let policy = self.policy.snapshot();
        let circuit_state = self.breaker.state();
        let span = validation_span(request, circuit_state);

        async move {
            let result = if !self.gate.validation_enabled(request).await {
                ValidationResult::skipped(request)
            } else {
                match self.breaker.try_admit(policy.clone()) {
                    Admission::Rejected(state) => {
                        tracing::debug!(circuit_state = %state, "Inventory lookup rejected fast");
                        ValidationResult::circuit_open(request)
                    }
                    Admission::Admitted(permit) => {
                        let deadline = Deadline::after(policy.timeout());
                        let result = self.validator.validate(request, deadline, &policy).await;
                        permit.record(result.authority_healthy());
                        result
                    }
                }
            };

            let verdict = decide(&result, &policy);
            if verdict.is_degraded() {
                if let Some(kind) = result.error_kind() {
                    tracing::warn!(
                        degraded = true,
                        error_kind = %kind,
                        "Inventory validation failed, admitting mutation (fail-open)"
                    );
                    self.telemetry.emit_degraded(kind);
                }
            } else if verdict == Verdict::RejectSystem {
                tracing::warn!(
                    error_kind = ?result.error_kind(),
                    "Inventory validation failed, rejecting mutation (fail-closed)"
                );
            }

            self.telemetry.emit_attempt(&ValidationSpan::new(
                request,
                &result,
                circuit_state,
                verdict.is_degraded(),
            ));

            Evaluation { verdict, result }
        }
        .instrument(span)
        .await
    }
}
