//! Request and result types for one validation call.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

/// Opaque correlation data supplied by the cart-mutation handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub correlation_id: Uuid,
    pub user_id: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl CallerContext {
    /// Context with a fresh correlation id.
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            user_id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = id;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl Default for CallerContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasons a [`ValidationRequest`] cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("product id must not be empty")]
    EmptyProductId,

    #[error("requested quantity must be positive")]
    ZeroQuantity,
}

/// One cart mutation awaiting validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRequest {
    product_id: String,
    requested_quantity: NonZeroU32,
    caller: CallerContext,
}

impl ValidationRequest {
    pub fn new(
        product_id: impl Into<String>,
        requested_quantity: u32,
        caller: CallerContext,
    ) -> Result<Self, RequestError> {
        let product_id = product_id.into();
        if product_id.trim().is_empty() {
            return Err(RequestError::EmptyProductId);
        }
        let requested_quantity =
            NonZeroU32::new(requested_quantity).ok_or(RequestError::ZeroQuantity)?;
        Ok(Self {
            product_id,
            requested_quantity,
            caller,
        })
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn requested_quantity(&self) -> u32 {
        self.requested_quantity.get()
    }

    pub fn caller(&self) -> &CallerContext {
        &self.caller
    }
}

/// Why a validation did not produce a clean "available" answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Well-formed answer: not enough stock.
    InsufficientInventory,
    /// The deadline passed before the authority answered.
    Timeout,
    /// The answer could not be parsed or lacked the availability field.
    InvalidResponse,
    /// Transport failure or error status from the authority.
    Unavailable,
    /// The breaker rejected the call without contacting the authority.
    CircuitOpen,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientInventory => "insufficient_inventory",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InvalidResponse => "invalid_response",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::CircuitOpen => "circuit_open",
        }
    }

    /// Failure of the validation system rather than a business answer.
    pub fn is_system_error(&self) -> bool {
        !matches!(self, ErrorKind::InsufficientInventory)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one validation call. Built once, never mutated.
///
/// Constructors uphold the invariants: an unperformed validation carries no
/// available quantity, and a performed one is valid only with enough stock
/// and no error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    product_id: String,
    requested_quantity: u32,
    is_valid: bool,
    available_quantity: Option<u32>,
    error_kind: Option<ErrorKind>,
    validation_performed: bool,
    duration: Duration,
    attempts: u32,
}

impl ValidationResult {
    /// Validation switched off: legacy pass-through.
    pub fn skipped(request: &ValidationRequest) -> Self {
        Self::bypass(request, None)
    }

    /// Breaker rejected the call fast.
    pub fn circuit_open(request: &ValidationRequest) -> Self {
        Self::bypass(request, Some(ErrorKind::CircuitOpen))
    }

    fn bypass(request: &ValidationRequest, error_kind: Option<ErrorKind>) -> Self {
        Self {
            product_id: request.product_id.clone(),
            requested_quantity: request.requested_quantity(),
            is_valid: true,
            available_quantity: None,
            error_kind,
            validation_performed: false,
            duration: Duration::ZERO,
            attempts: 0,
        }
    }

    /// The authority answered with a quantity.
    pub fn checked(
        request: &ValidationRequest,
        available_quantity: u32,
        duration: Duration,
        attempts: u32,
    ) -> Self {
        let is_valid = available_quantity >= request.requested_quantity();
        Self {
            product_id: request.product_id.clone(),
            requested_quantity: request.requested_quantity(),
            is_valid,
            available_quantity: Some(available_quantity),
            error_kind: (!is_valid).then_some(ErrorKind::InsufficientInventory),
            validation_performed: true,
            duration,
            attempts,
        }
    }

    /// An attempt was made but produced no usable answer.
    pub fn failed(
        request: &ValidationRequest,
        error_kind: ErrorKind,
        duration: Duration,
        attempts: u32,
    ) -> Self {
        Self {
            product_id: request.product_id.clone(),
            requested_quantity: request.requested_quantity(),
            is_valid: false,
            available_quantity: None,
            error_kind: Some(error_kind),
            validation_performed: true,
            duration,
            attempts,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn requested_quantity(&self) -> u32 {
        self.requested_quantity
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn available_quantity(&self) -> Option<u32> {
        self.available_quantity
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    pub fn validation_performed(&self) -> bool {
        self.validation_performed
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Remote attempts made, retries included.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the authority behaved, regardless of the stock answer.
    /// This is what the breaker records.
    pub fn authority_healthy(&self) -> bool {
        self.validation_performed && !self.error_kind.is_some_and(|k| k.is_system_error())
    }
}
