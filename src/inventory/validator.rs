//! Inventory validation.
//!
//! Issues the lookup under the caller's deadline, retries transient
//! failures, and classifies the outcome into a `ValidationResult`.

use std::sync::Arc;

use tokio::time::Instant;

use crate::config::ValidationPolicy;
use crate::gate::types::{ErrorKind, ValidationRequest, ValidationResult};
use crate::inventory::client::InventoryAuthority;
use crate::resilience::{with_deadline, Deadline, RetryPlan};

#[derive(Clone)]
pub struct InventoryValidator {
    authority: Arc<dyn InventoryAuthority>,
}

impl InventoryValidator {
    pub fn new(authority: Arc<dyn InventoryAuthority>) -> Self {
        Self { authority }
    }

    /// Validate `request` against the authority, finishing by `deadline`.
    pub async fn validate(
        &self,
        request: &ValidationRequest,
        deadline: Deadline,
        policy: &ValidationPolicy,
    ) -> ValidationResult {
        let started = Instant::now();
        let retry = RetryPlan::from_policy(policy);
        let product_id = request.product_id();
        let mut attempts = 0;

        loop {
            attempts += 1;

            let lookup = match with_deadline(deadline, self.authority.lookup(product_id)).await {
                Ok(lookup) => lookup,
                Err(_) => {
                    tracing::warn!(
                        product_id,
                        attempts,
                        timeout_ms = policy.timeout_ms,
                        "Inventory lookup timed out"
                    );
                    return ValidationResult::failed(
                        request,
                        ErrorKind::Timeout,
                        started.elapsed(),
                        attempts,
                    );
                }
            };

            let error = match lookup.and_then(|record| record.available_quantity(product_id)) {
                Ok(available) => {
                    tracing::debug!(
                        product_id,
                        available,
                        requested = request.requested_quantity(),
                        attempts,
                        "Inventory lookup succeeded"
                    );
                    return ValidationResult::checked(
                        request,
                        available,
                        started.elapsed(),
                        attempts,
                    );
                }
                Err(error) => error,
            };

            if let Some(delay) = retry.next_delay(attempts, &error, &deadline) {
                tracing::debug!(
                    product_id,
                    attempts,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Transient inventory failure, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            tracing::warn!(
                product_id,
                requested = request.requested_quantity(),
                attempts,
                error = %error,
                transient = error.is_transient(),
                "Inventory lookup failed"
            );
            return ValidationResult::failed(
                request,
                error.error_kind(),
                started.elapsed(),
                attempts,
            );
        }
    }
}

impl std::fmt::Debug for InventoryValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryValidator").finish_non_exhaustive()
    }
}
