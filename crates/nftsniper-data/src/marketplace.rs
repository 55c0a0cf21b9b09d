//! Marketplace asset endpoint client

use alloy_primitives::Address;
use nftsniper_core::DiscoveryError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Asset endpoint response; orders stay raw so the full listing payload can
/// ride along into execution.
#[derive(Debug, Clone, Deserialize)]
struct AssetResponse {
    #[serde(default)]
    orders: Vec<Value>,
}

/// Marketplace REST client
pub struct MarketplaceClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl MarketplaceClient {
    /// Create a new marketplace client
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// Fetch the open orders attached to one asset.
    ///
    /// A missing asset is not a fault; it yields no orders.
    pub async fn fetch_asset_orders(
        &self,
        contract: Address,
        token_id: &str,
    ) -> Result<Vec<Value>, DiscoveryError> {
        let url = format!(
            "{}/api/v1/asset/{:#x}/{}/",
            self.base_url, contract, token_id
        );

        debug!(url = %url, "Fetching asset orders");

        let mut request = self.client.get(&url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DiscoveryError::HttpError(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::StatusError { code, message });
        }

        let asset: AssetResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;

        Ok(asset.orders)
    }
}
