//! Collaborator seams consumed by the engine.

use crate::error::{DiscoveryError, ProtocolError};
use crate::types::{CandidateOrder, CounterOrderParams, CredentialsRef, PreparedOrder};
use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

/// Upstream listing discovery.
///
/// Any failure is treated by the scheduler as "no candidates this cycle":
/// an event is emitted and the task is rescheduled.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch candidate sell listings for a collection, already filtered to
    /// roughly the price band at or below `ceiling` (base units). The
    /// matcher applies the authoritative filter afterwards.
    async fn fetch_listings(
        &self,
        contract: Address,
        ceiling: U256,
    ) -> Result<Vec<CandidateOrder>, DiscoveryError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Exchange-protocol operations needed to settle a purchase.
///
/// Implementations own signing, ABI construction, and transport. Failures
/// are typed: validation rejection vs transport vs signer-denied.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Assemble the buy-side counter-order for a listing from the engine's
    /// computed parameters and the task's credentials.
    async fn build_counter_order(
        &self,
        credentials: &CredentialsRef,
        listing: &CandidateOrder,
        params: &CounterOrderParams,
    ) -> Result<PreparedOrder, ProtocolError>;

    /// Whether a single order passes protocol validation.
    async fn validate_order(&self, payload: &serde_json::Value) -> Result<bool, ProtocolError>;

    /// Whether the counter-order and listing are structurally compatible
    /// (payment token, sides, call targets, time windows).
    async fn orders_can_match(
        &self,
        counter: &PreparedOrder,
        listing: &CandidateOrder,
    ) -> Result<bool, ProtocolError>;

    /// Estimate the execution cost of settling the pair, in gas units.
    async fn estimate_execution_cost(
        &self,
        counter: &PreparedOrder,
        listing: &CandidateOrder,
    ) -> Result<U256, ProtocolError>;

    /// Broadcast the settlement transaction with the given gas budget.
    /// Returns on broadcast acceptance, not on confirmation.
    async fn submit_execution(
        &self,
        counter: &PreparedOrder,
        listing: &CandidateOrder,
        budget: U256,
    ) -> Result<TxHash, ProtocolError>;
}
