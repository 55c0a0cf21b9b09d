//! Protocol client that approves everything and fabricates settlement

use alloy_primitives::{Address, B256, TxHash, U256};
use async_trait::async_trait;
use nftsniper_core::{
    CandidateOrder, CounterOrderParams, CredentialsRef, OrderSide, PreparedOrder, ProtocolClient,
    ProtocolError,
};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Placeholder buyer identity used when no signer is wired up
const DRY_RUN_MAKER: Address = Address::repeat_byte(0xdd);

/// Fabricated execution cost, in gas units
const DEFAULT_ESTIMATED_COST: u64 = 300_000;

/// Stand-in protocol client for rehearsals.
///
/// Builds structurally complete counter-orders, passes every validation,
/// and fabricates deterministic transaction hashes instead of broadcasting
/// anything. Lets the whole engine run end to end without keys or funds.
pub struct DryRunProtocol {
    maker: Address,
    estimated_cost: U256,
    submissions: AtomicU64,
}

impl DryRunProtocol {
    pub fn new() -> Self {
        Self {
            maker: DRY_RUN_MAKER,
            estimated_cost: U256::from(DEFAULT_ESTIMATED_COST),
            submissions: AtomicU64::new(0),
        }
    }

    /// Override the fabricated buyer address
    pub fn with_maker(mut self, maker: Address) -> Self {
        self.maker = maker;
        self
    }

    /// Override the fabricated execution cost estimate
    pub fn with_estimated_cost(mut self, cost: U256) -> Self {
        self.estimated_cost = cost;
        self
    }

    /// Number of fabricated submissions so far
    pub fn submission_count(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }
}

impl Default for DryRunProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolClient for DryRunProtocol {
    async fn build_counter_order(
        &self,
        credentials: &CredentialsRef,
        listing: &CandidateOrder,
        params: &CounterOrderParams,
    ) -> Result<PreparedOrder, ProtocolError> {
        let payload = json!({
            "maker": format!("{:#x}", self.maker),
            "taker": format!("{:#x}", listing.seller),
            "side": OrderSide::Sell.flip().as_u8(),
            "base_price": listing.price.to_string(),
            "fee_recipient": format!("{:#x}", params.fee_recipient),
            "listing_time": params.listing_time,
            "expiration_time": params.expiration_time,
            "salt": params.salt.to_string(),
            "credentials": credentials.id(),
        });

        Ok(PreparedOrder {
            maker: self.maker,
            params: params.clone(),
            payload,
        })
    }

    async fn validate_order(&self, _payload: &serde_json::Value) -> Result<bool, ProtocolError> {
        Ok(true)
    }

    async fn orders_can_match(
        &self,
        _counter: &PreparedOrder,
        _listing: &CandidateOrder,
    ) -> Result<bool, ProtocolError> {
        Ok(true)
    }

    async fn estimate_execution_cost(
        &self,
        _counter: &PreparedOrder,
        _listing: &CandidateOrder,
    ) -> Result<U256, ProtocolError> {
        Ok(self.estimated_cost)
    }

    async fn submit_execution(
        &self,
        _counter: &PreparedOrder,
        listing: &CandidateOrder,
        budget: U256,
    ) -> Result<TxHash, ProtocolError> {
        let sequence = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        let tx_hash = B256::from(U256::from(sequence));

        info!(
            tx_hash = %tx_hash,
            listing_id = %listing.listing_id,
            price = %listing.price,
            budget = %budget,
            "Dry-run settlement accepted"
        );

        Ok(tx_hash)
    }
}
