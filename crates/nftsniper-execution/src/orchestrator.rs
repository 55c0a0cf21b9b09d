//! Purchase orchestration for one matched listing

use crate::confirm::{poll_until, PollSettings};
use crate::counter_order;
use alloy_primitives::U256;
use chrono::Utc;
use nftsniper_core::{
    CandidateOrder, ConfirmError, ExecutionConfig, PreparedOrder, ProtocolClient, ProtocolError,
    PurchaseOutcome, Task,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives one matched listing through checkout: price re-verification,
/// counter-order construction, order-pair validation, cost estimation, and
/// submission.
///
/// Every failure mode folds into a [`PurchaseOutcome`]; nothing here can
/// take down the task that called it.
pub struct PurchaseOrchestrator<P> {
    protocol: Arc<P>,
    config: ExecutionConfig,
}

impl<P: ProtocolClient> PurchaseOrchestrator<P> {
    pub fn new(protocol: Arc<P>, config: ExecutionConfig) -> Self {
        Self { protocol, config }
    }

    /// Attempt to buy one matched listing
    pub async fn attempt(&self, task: &Task, listing: &CandidateOrder) -> PurchaseOutcome {
        // The match ran against a snapshot; the ceiling is re-checked on the
        // candidate actually being bought before anything is spent.
        if listing.price > task.ceiling_price {
            debug!(
                contract = %task.contract,
                listing_id = %listing.listing_id,
                price = %listing.price,
                ceiling = %task.ceiling_price,
                "Listing price is above the ceiling"
            );
            return PurchaseOutcome::NoPriceMatch;
        }

        let now = Utc::now().timestamp().max(0) as u64;
        let params = match counter_order::counter_order_params(listing, &self.config, now) {
            Ok(params) => params,
            Err(e) => return PurchaseOutcome::ValidationFailed(e.to_string()),
        };

        let prepared = match self
            .protocol
            .build_counter_order(&task.credentials, listing, &params)
            .await
        {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(contract = %task.contract, error = %e, "Counter-order construction failed");
                return PurchaseOutcome::ValidationFailed(e.to_string());
            }
        };

        if let Err(ConfirmError::TimedOut {
            attempts,
            last_error,
        }) = self.validate_pair(&prepared, listing).await
        {
            warn!(
                contract = %task.contract,
                listing_id = %listing.listing_id,
                attempts,
                error = %last_error,
                "Order pair failed validation"
            );
            return PurchaseOutcome::ValidationFailed(last_error);
        }

        let estimate = match self
            .protocol
            .estimate_execution_cost(&prepared, listing)
            .await
        {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!(contract = %task.contract, error = %e, "Execution cost estimation failed");
                return PurchaseOutcome::SubmissionFailed(e.to_string());
            }
        };
        let budget = apply_margin(estimate, self.config.gas_margin_bps);

        debug!(
            contract = %task.contract,
            listing_id = %listing.listing_id,
            estimate = %estimate,
            budget = %budget,
            "Submitting settlement"
        );

        match self
            .protocol
            .submit_execution(&prepared, listing, budget)
            .await
        {
            Ok(tx_hash) => {
                info!(
                    contract = %task.contract,
                    tx_hash = %tx_hash,
                    price = %listing.price,
                    "Purchase submitted"
                );
                PurchaseOutcome::Success(tx_hash)
            }
            Err(e) => {
                warn!(contract = %task.contract, error = %e, "Settlement submission failed");
                PurchaseOutcome::SubmissionFailed(e.to_string())
            }
        }
    }

    /// Validate both orders and their compatibility, retrying on a fixed
    /// delay. Validation reads live chain state, so a rejection can heal
    /// between attempts.
    async fn validate_pair(
        &self,
        prepared: &PreparedOrder,
        listing: &CandidateOrder,
    ) -> Result<(), ConfirmError> {
        let settings = PollSettings::new(
            Duration::from_millis(self.config.validation_retry_delay_ms),
            self.config.validation_attempts,
        );

        poll_until(settings, || {
            let protocol = Arc::clone(&self.protocol);
            let prepared = prepared.clone();
            let listing = listing.clone();

            async move {
                if !protocol.validate_order(&prepared.payload).await? {
                    return Err(ProtocolError::ValidationRejected(
                        "counter-order failed validation".to_string(),
                    ));
                }
                if !protocol.validate_order(&listing.raw_payload).await? {
                    return Err(ProtocolError::ValidationRejected(
                        "listing failed validation".to_string(),
                    ));
                }
                if !protocol.orders_can_match(&prepared, &listing).await? {
                    return Err(ProtocolError::ValidationRejected(
                        "orders cannot be matched".to_string(),
                    ));
                }
                Ok(Some(()))
            }
        })
        .await
    }
}

/// Scale a cost estimate by the configured margin, rounding up
fn apply_margin(estimate: U256, margin_bps: u64) -> U256 {
    const DENOMINATOR: u64 = 10_000;

    estimate
        .saturating_mul(U256::from(margin_bps))
        .saturating_add(U256::from(DENOMINATOR - 1))
        / U256::from(DENOMINATOR)
}
