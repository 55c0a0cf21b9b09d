use alloy_primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task lifecycle and outcome events, keyed by collection contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskEvent {
    /// A purchase attempt is starting for a matched listing
    StartBuy(StartBuyEvent),

    /// A purchase was broadcast and accepted
    BuySuccess(BuySuccessEvent),

    /// A purchase attempt failed; the task is rescheduled
    BuyError(BuyErrorEvent),

    /// A poll cycle found nothing purchasable
    NoData(NoDataEvent),

    /// The task reached its target and ended
    TaskEnd(TaskEndEvent),

    /// An upstream failure interrupted a poll cycle
    GenericError(GenericErrorEvent),
}

impl TaskEvent {
    /// Get the event kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            TaskEvent::StartBuy(_) => "start_buy",
            TaskEvent::BuySuccess(_) => "buy_success",
            TaskEvent::BuyError(_) => "buy_error",
            TaskEvent::NoData(_) => "no_data",
            TaskEvent::TaskEnd(_) => "task_end",
            TaskEvent::GenericError(_) => "generic_error",
        }
    }

    /// Get the contract the event belongs to
    pub fn contract(&self) -> Address {
        match self {
            TaskEvent::StartBuy(e) => e.contract,
            TaskEvent::BuySuccess(e) => e.contract,
            TaskEvent::BuyError(e) => e.contract,
            TaskEvent::NoData(e) => e.contract,
            TaskEvent::TaskEnd(e) => e.contract,
            TaskEvent::GenericError(e) => e.contract,
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TaskEvent::StartBuy(e) => e.timestamp,
            TaskEvent::BuySuccess(e) => e.timestamp,
            TaskEvent::BuyError(e) => e.timestamp,
            TaskEvent::NoData(e) => e.timestamp,
            TaskEvent::TaskEnd(e) => e.timestamp,
            TaskEvent::GenericError(e) => e.timestamp,
        }
    }
}

/// Purchase attempt starting event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartBuyEvent {
    pub contract: Address,
    pub listing_id: String,
    /// Listing price in base units
    pub price: U256,
    pub timestamp: DateTime<Utc>,
}

impl StartBuyEvent {
    pub fn new(contract: Address, listing_id: String, price: U256) -> Self {
        Self {
            contract,
            listing_id,
            price,
            timestamp: Utc::now(),
        }
    }
}

/// Purchase broadcast accepted event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuySuccessEvent {
    pub contract: Address,
    pub tx_hash: TxHash,
    /// Price paid in base units
    pub price: U256,
    /// Task success counter after this purchase
    pub success_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl BuySuccessEvent {
    pub fn new(contract: Address, tx_hash: TxHash, price: U256, success_count: u32) -> Self {
        Self {
            contract,
            tx_hash,
            price,
            success_count,
            timestamp: Utc::now(),
        }
    }
}

/// Purchase attempt failure event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyErrorEvent {
    pub contract: Address,
    /// Listing the attempt targeted, when one was matched
    pub listing_id: Option<String>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl BuyErrorEvent {
    pub fn new(contract: Address, listing_id: Option<String>, reason: String) -> Self {
        Self {
            contract,
            listing_id,
            reason,
            timestamp: Utc::now(),
        }
    }
}

/// Empty poll cycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoDataEvent {
    pub contract: Address,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl NoDataEvent {
    pub fn new(contract: Address, detail: impl Into<String>) -> Self {
        Self {
            contract,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Task satisfied event; emitted exactly once per task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEndEvent {
    pub contract: Address,
    pub success_count: u32,
    pub target_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl TaskEndEvent {
    pub fn new(contract: Address, success_count: u32, target_count: u32) -> Self {
        Self {
            contract,
            success_count,
            target_count,
            timestamp: Utc::now(),
        }
    }
}

/// Unexpected upstream failure event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericErrorEvent {
    pub contract: Address,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl GenericErrorEvent {
    pub fn new(contract: Address, message: impl Into<String>) -> Self {
        Self {
            contract,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
