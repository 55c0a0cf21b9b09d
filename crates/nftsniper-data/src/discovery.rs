//! Composite listing discovery: aggregator search, then per-token order fetch

use crate::aggregator::AggregatorClient;
use crate::marketplace::MarketplaceClient;
use crate::normalize;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use nftsniper_core::{CandidateOrder, DiscoveryConfig, DiscoveryError, ListingSource, Network};
use std::time::Duration;
use tracing::{debug, warn};

/// Two-stage discovery pipeline.
///
/// The aggregator narrows a collection down to its cheapest buy-now tokens;
/// the marketplace asset endpoint then supplies the live orders for each of
/// those tokens. A failed aggregator search fails the whole cycle, while a
/// failed per-token fetch only drops that token.
pub struct ListingDiscovery {
    aggregator: AggregatorClient,
    marketplace: MarketplaceClient,
}

impl ListingDiscovery {
    /// Build the pipeline from the discovery section of the configuration
    pub fn new(config: &DiscoveryConfig, network: Network) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        Self {
            aggregator: AggregatorClient::new(
                config.aggregator_url.clone(),
                config.search_limit,
                timeout,
            ),
            marketplace: MarketplaceClient::new(
                config.marketplace_base(network),
                config.api_key.clone(),
                timeout,
            ),
        }
    }
}

#[async_trait]
impl ListingSource for ListingDiscovery {
    async fn fetch_listings(
        &self,
        contract: Address,
        ceiling: U256,
    ) -> Result<Vec<CandidateOrder>, DiscoveryError> {
        let tokens = self.aggregator.search_tokens(contract, ceiling).await?;

        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates = Vec::new();
        for token_id in &tokens {
            let orders = match self.marketplace.fetch_asset_orders(contract, token_id).await {
                Ok(orders) => orders,
                Err(e) => {
                    warn!(
                        contract = %contract,
                        token_id = %token_id,
                        error = %e,
                        "Asset order fetch failed, skipping token"
                    );
                    continue;
                }
            };

            candidates.extend(normalize::candidates_from_orders(orders, token_id));
        }

        debug!(
            contract = %contract,
            tokens = tokens.len(),
            candidates = candidates.len(),
            "Discovery cycle complete"
        );

        Ok(candidates)
    }

    fn name(&self) -> &str {
        "aggregator-marketplace"
    }
}
