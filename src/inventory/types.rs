//! Inventory authority wire types and lookup errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gate::types::ErrorKind;

/// The only `inventory.schemaVersion` this gate understands.
pub const INVENTORY_SCHEMA_VERSION: u32 = 1;

/// Errors from a single lookup attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Connect failure, reset, or body cut short.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Authority answered 502/503/504.
    #[error("inventory authority unavailable (HTTP {0})")]
    Unavailable(u16),

    /// Any other non-success status.
    #[error("inventory authority returned HTTP {0}")]
    Status(u16),

    #[error("product {0} not found")]
    NotFound(String),

    /// Undecodable body or missing/unsupported availability field.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LookupError {
    /// Worth one more attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Connect(_) | LookupError::Unavailable(_))
    }

    /// Classify an HTTP status that is not a success.
    pub fn from_status(status: u16, product_id: &str) -> Self {
        match status {
            404 => LookupError::NotFound(product_id.to_string()),
            502..=504 => LookupError::Unavailable(status),
            _ => LookupError::Status(status),
        }
    }

    pub fn error_kind(&self) -> ErrorKind {
        match self {
            LookupError::InvalidResponse(_) => ErrorKind::InvalidResponse,
            LookupError::Connect(_)
            | LookupError::Unavailable(_)
            | LookupError::Status(_)
            | LookupError::NotFound(_) => ErrorKind::Unavailable,
        }
    }
}

/// Price as carried by the product catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Money {
    pub currency_code: String,
    pub units: i64,
    pub nanos: i32,
}

/// Versioned availability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevel {
    pub schema_version: u32,
    pub available_quantity: u32,
}

/// Product record returned by the authority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub picture: String,
    #[serde(default)]
    pub price_usd: Option<Money>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub inventory: Option<InventoryLevel>,
}

impl ProductRecord {
    /// Extract availability for `expected_id`. Never guesses a value.
    pub fn available_quantity(&self, expected_id: &str) -> Result<u32, LookupError> {
        if self.id != expected_id {
            return Err(LookupError::InvalidResponse(format!(
                "asked for product {expected_id}, got {}",
                self.id
            )));
        }
        match self.inventory {
            Some(level) if level.schema_version == INVENTORY_SCHEMA_VERSION => {
                Ok(level.available_quantity)
            }
            Some(level) => Err(LookupError::InvalidResponse(format!(
                "unsupported inventory schemaVersion {}",
                level.schema_version
            ))),
            None => Err(LookupError::InvalidResponse(
                "response carries no inventory field".to_string(),
            )),
        }
    }
}
