//! Core domain types for the acquisition engine.

use crate::error::TaskError;
use crate::units::{self, NATIVE_DECIMALS};
use alloy_primitives::{Address, TxHash, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque reference to signing material.
///
/// The engine never holds keys; this names a credential set that the
/// protocol collaborator resolves to a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRef(String);

impl CredentialsRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialsRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of a marketplace order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The opposite side, used when constructing a counter-order
    pub fn flip(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Wire encoding used by the marketplace (0 = buy, 1 = sell)
    pub fn as_u8(self) -> u8 {
        match self {
            OrderSide::Buy => 0,
            OrderSide::Sell => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(OrderSide::Buy),
            1 => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

/// Caller-facing description of one watch task.
///
/// Appears verbatim in the `[[tasks]]` config sections; validated and
/// converted into a [`Task`] by the scheduler's add operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Name of the credential set to sign purchases with
    pub credentials_ref: String,
    /// Collection contract address, hex of any case
    pub contract: String,
    /// Chain RPC endpoint for the protocol collaborator
    pub rpc_endpoint: String,
    /// Maximum acceptable price, in whole-coin units
    pub ceiling_price: Decimal,
    /// Number of successful purchases that satisfies the task
    pub target_count: u32,
    /// Time between poll cycles
    pub poll_interval_ms: u64,
}

impl TaskSpec {
    /// Validate every field and convert into a registry [`Task`].
    ///
    /// The decimal ceiling is converted to integer base units here, exactly
    /// once; nothing downstream sees a decimal price again.
    pub fn into_task(self) -> Result<Task, TaskError> {
        let contract = parse_contract(&self.contract)?;

        if self.credentials_ref.trim().is_empty() {
            return Err(invalid_field("credentials_ref", "must not be empty"));
        }
        if self.rpc_endpoint.trim().is_empty() {
            return Err(invalid_field("rpc_endpoint", "must not be empty"));
        }
        if self.target_count == 0 {
            return Err(invalid_field("target_count", "must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid_field("poll_interval_ms", "must be greater than zero"));
        }

        let ceiling_price = units::to_base_units(self.ceiling_price, NATIVE_DECIMALS)
            .map_err(|e| invalid_field("ceiling_price", e.to_string()))?;
        if ceiling_price.is_zero() {
            return Err(invalid_field("ceiling_price", "must be greater than zero"));
        }

        Ok(Task {
            contract,
            ceiling_price,
            target_count: self.target_count,
            success_count: 0,
            poll_interval_ms: self.poll_interval_ms,
            credentials: CredentialsRef::new(self.credentials_ref),
            rpc_endpoint: self.rpc_endpoint,
        })
    }
}

/// Parse a contract address key.
///
/// Any hex casing normalizes to the same 20-byte key, so task uniqueness is
/// case-insensitive by construction.
pub fn parse_contract(raw: &str) -> Result<Address, TaskError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| invalid_field("contract", format!("invalid address: {e}")))
}

fn invalid_field(field: &str, message: impl Into<String>) -> TaskError {
    TaskError::InvalidField {
        field: field.to_string(),
        message: message.into(),
    }
}

/// A watched collection with its purchase budget and progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub contract: Address,
    /// Maximum acceptable price in the chain's smallest unit
    pub ceiling_price: U256,
    pub target_count: u32,
    pub success_count: u32,
    pub poll_interval_ms: u64,
    pub credentials: CredentialsRef,
    pub rpc_endpoint: String,
}

impl Task {
    /// Whether the task has reached its purchase target
    pub fn is_satisfied(&self) -> bool {
        self.success_count >= self.target_count
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Normalized read-only view of one upstream sell listing.
///
/// Constructed fresh each poll cycle and discarded after use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateOrder {
    /// Upstream identifier (order hash or token id)
    pub listing_id: String,
    pub seller: Address,
    /// Price in the chain's smallest unit
    pub price: U256,
    /// Epoch seconds; 0 means the listing never expires
    pub expires_at: u64,
    /// Fee recipient carried by the listing; zero when it has none
    pub fee_recipient: Address,
    /// Original upstream record, handed to the protocol collaborator unmodified
    pub raw_payload: serde_json::Value,
}

/// Outcome of narrowing one cycle's candidates
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    Matched(CandidateOrder),
}

/// Parameters the engine computes for the buy-side counter-order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterOrderParams {
    /// Epoch seconds, backdated by the clock-skew allowance
    pub listing_time: u64,
    /// Epoch seconds; 0 means non-expiring
    pub expiration_time: u64,
    /// Fee recipient flipped against the listing's
    pub fee_recipient: Address,
    /// Fresh replay-safety nonce
    pub salt: U256,
}

/// A constructed counter-order awaiting validation and submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedOrder {
    /// Buyer address resolved from the task's credentials
    pub maker: Address,
    pub params: CounterOrderParams,
    /// Protocol-specific order body, opaque to the engine
    pub payload: serde_json::Value,
}

/// Tagged result of one poll cycle's purchase attempt.
///
/// Drives both the scheduler's counters and the emitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Broadcast accepted; the hash is the unit of success
    Success(TxHash),
    /// No candidate survived discovery and matching
    NoListing,
    /// The listing's price moved above the ceiling before purchase
    NoPriceMatch,
    /// Protocol validation rejected the order pair
    ValidationFailed(String),
    /// Cost estimation or broadcast failed
    SubmissionFailed(String),
}

impl PurchaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PurchaseOutcome::Success(_))
    }
}
