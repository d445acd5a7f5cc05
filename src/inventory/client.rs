//! Inventory authority client.
//!
//! # Responsibilities
//! - Look up one product record per call
//! - Classify transport failures and statuses into `LookupError`
//! - Reuse pooled connections across calls
//!
//! No per-request timeout lives here: the caller's deadline cancels the
//! lookup by dropping its future.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::config::InventoryConfig;
use crate::inventory::types::{LookupError, ProductRecord};

/// Remote source of product records.
#[async_trait]
pub trait InventoryAuthority: Send + Sync {
    async fn lookup(&self, product_id: &str) -> Result<ProductRecord, LookupError>;
}

/// The client could not be constructed.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid inventory base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP/JSON client for the product catalog.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: Url,
    product_path: String,
}

impl HttpInventoryClient {
    pub fn new(config: &InventoryConfig) -> Result<Self, ClientBuildError> {
        let base_url = Url::parse(&config.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_nodelay(true)
            .build()?;

        tracing::info!(
            base_url = %base_url,
            product_path = %config.product_path,
            "Inventory client initialized"
        );

        Ok(Self {
            client,
            base_url,
            product_path: config.product_path.clone(),
        })
    }

    /// URL for one product.
    ///
    /// `product_path` segments are appended to `base_url`, keeping any path
    /// prefix it carries. The id is encoded as a single path segment.
    pub fn product_url(&self, product_id: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                LookupError::InvalidResponse(format!(
                    "cannot build lookup URL from {}",
                    self.base_url
                ))
            })?;
            segments.pop_if_empty();
            for segment in self.product_path.split('/').filter(|s| !s.is_empty()) {
                segments.push(&segment.replace("{id}", product_id));
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl InventoryAuthority for HttpInventoryClient {
    async fn lookup(&self, product_id: &str) -> Result<ProductRecord, LookupError> {
        let url = self.product_url(product_id)?;

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| LookupError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::from_status(status.as_u16(), product_id));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::Connect(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| LookupError::InvalidResponse(e.to_string()))
    }
}
