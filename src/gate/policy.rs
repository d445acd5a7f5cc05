//! Verdict policy.
//!
//! A pure mapping from (ValidationResult, ValidationPolicy) to the verdict
//! handed back to the cart-mutation handler. No I/O happens here.

use std::fmt;

use thiserror::Error;

use crate::config::ValidationPolicy;
use crate::gate::types::{ErrorKind, ValidationResult};

/// Detail of a business rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientInventory {
    pub product_id: String,
    pub requested: u32,
    pub available: u32,
}

impl fmt::Display for InsufficientInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient inventory for product {}: requested {}, available {}",
            self.product_id, self.requested, self.available
        )
    }
}

/// Final decision for one cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Proceed with the mutation. `degraded` is set when validation failed
    /// and the fail-open policy let it through.
    Admit { degraded: bool },
    /// Not enough stock.
    RejectBusiness(InsufficientInventory),
    /// Validation failed and the policy is fail-closed.
    RejectSystem,
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit { .. })
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Verdict::Admit { degraded: true })
    }

    /// Convert into the error the cart handler propagates.
    pub fn into_result(self) -> Result<(), GateRejection> {
        match self {
            Verdict::Admit { .. } => Ok(()),
            Verdict::RejectBusiness(detail) => Err(GateRejection::InsufficientInventory {
                product_id: detail.product_id,
                requested: detail.requested,
                available: detail.available,
            }),
            Verdict::RejectSystem => Err(GateRejection::Unavailable),
        }
    }
}

/// The only error a cart-mutation handler ever sees from the gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("insufficient inventory for product {product_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        product_id: String,
        requested: u32,
        available: u32,
    },

    #[error("inventory validation is temporarily unavailable, please try again later")]
    Unavailable,
}

/// Map a validation result to a verdict.
pub fn decide(result: &ValidationResult, policy: &ValidationPolicy) -> Verdict {
    match result.error_kind() {
        None => Verdict::Admit { degraded: false },
        Some(ErrorKind::InsufficientInventory) => match result.available_quantity() {
            Some(available) => Verdict::RejectBusiness(InsufficientInventory {
                product_id: result.product_id().to_string(),
                requested: result.requested_quantity(),
                available,
            }),
            None => system_failure(policy),
        },
        Some(_) => system_failure(policy),
    }
}

fn system_failure(policy: &ValidationPolicy) -> Verdict {
    if policy.fail_open {
        Verdict::Admit { degraded: true }
    } else {
        Verdict::RejectSystem
    }
}
