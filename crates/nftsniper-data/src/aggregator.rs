//! Aggregator search client for collection-wide token discovery

use alloy_primitives::{Address, U256};
use nftsniper_core::DiscoveryError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Aggregator search response
#[derive(Debug, Clone, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

/// One token row in a search response
#[derive(Debug, Clone, Deserialize)]
struct SearchItem {
    #[serde(default)]
    id: String,
}

/// Aggregator search client
pub struct AggregatorClient {
    url: String,
    limit: u32,
    client: Client,
}

impl AggregatorClient {
    /// Create a new aggregator client
    pub fn new(url: String, limit: u32, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { url, limit, client }
    }

    /// Search buy-now tokens for a collection, cheapest first, priced at or
    /// under the ceiling.
    ///
    /// Returns the token ids of the matching assets; orders are fetched per
    /// token from the marketplace afterwards.
    pub async fn search_tokens(
        &self,
        contract: Address,
        ceiling: U256,
    ) -> Result<Vec<String>, DiscoveryError> {
        let body = search_body(contract, ceiling, self.limit);

        debug!(contract = %contract, "Searching aggregator for buy-now tokens");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| DiscoveryError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::StatusError { code, message });
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::ParseError(e.to_string()))?;

        let tokens: Vec<String> = search
            .data
            .into_iter()
            .map(|item| item.id)
            .filter(|id| !id.is_empty())
            .collect();

        debug!(contract = %contract, count = tokens.len(), "Aggregator search complete");

        Ok(tokens)
    }
}

/// Search request body. The price bound travels as a base-unit decimal
/// string; the ascending price sort keeps the cheapest tokens on the first
/// page.
fn search_body(contract: Address, ceiling: U256, limit: u32) -> Value {
    json!({
        "filters": {
            "traits": {},
            "traitsRange": {},
            "searchText": "",
            "address": format!("{contract:#x}"),
            "price": { "symbol": "ETH", "high": ceiling.to_string() }
        },
        "sort": { "currentEthPrice": "asc" },
        "fields": {
            "id": 1,
            "currentBasePrice": 1,
            "paymentToken": 1,
            "marketplace": 1,
            "tokenId": 1,
            "priceInfo": 1,
            "sellOrders": 1,
            "startingPrice": 1
        },
        "offset": 0,
        "limit": limit,
        "markets": [],
        "status": ["buy_now"]
    })
}
