//! Counter-order parameter computation

use alloy_primitives::{Address, U256};
use nftsniper_core::{CandidateOrder, CounterOrderParams, ExecutionConfig, ProtocolError};
use rand::RngCore;

/// Shortest acceptable lifetime for an expiring order
pub const MIN_EXPIRATION_SECS: u64 = 10;

/// Auction orders stay open this long past their scheduled end so the
/// settlement layer can still match them
pub const ORDER_MATCHING_LATENCY_SECS: u64 = 7 * 24 * 60 * 60;

/// Resolved listing/expiration times for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTimes {
    pub listing_time: u64,
    pub expiration_time: u64,
}

/// Resolve and validate order times.
///
/// Zero means "unset": an unset expiration never expires, an unset listing
/// time is picked here. Immediate orders are backdated by `skew_secs` to
/// absorb clock skew between the engine and the chain; auction orders start
/// at their scheduled end and stay matchable for the latency window.
pub fn order_times(
    now: u64,
    expiration: u64,
    listing: u64,
    auction: bool,
    skew_secs: u64,
) -> Result<OrderTimes, ProtocolError> {
    let min_expiration = now + MIN_EXPIRATION_SECS;

    if expiration != 0 && expiration < min_expiration {
        return Err(rejected(format!(
            "expiration must be at least {MIN_EXPIRATION_SECS} seconds from now, or zero (non-expiring)"
        )));
    }
    if listing != 0 && listing < now {
        return Err(rejected("listing time cannot be in the past"));
    }
    if listing != 0 && expiration != 0 && listing >= expiration {
        return Err(rejected("listing time must be before the expiration time"));
    }
    if auction && expiration == 0 {
        return Err(rejected("auctions must have an expiration time"));
    }
    if auction && listing != 0 {
        return Err(rejected("auctions cannot be scheduled for the future"));
    }

    if auction {
        Ok(OrderTimes {
            listing_time: expiration,
            expiration_time: expiration + ORDER_MATCHING_LATENCY_SECS,
        })
    } else {
        let listing_time = if listing != 0 {
            listing
        } else {
            now.saturating_sub(skew_secs)
        };
        Ok(OrderTimes {
            listing_time,
            expiration_time: expiration,
        })
    }
}

/// Compute the engine-side parameters of the buy-side counter-order for a
/// listing: immediate non-expiring times, the flipped fee recipient, and a
/// fresh salt.
pub fn counter_order_params(
    listing: &CandidateOrder,
    config: &ExecutionConfig,
    now: u64,
) -> Result<CounterOrderParams, ProtocolError> {
    let times = order_times(now, 0, 0, false, config.listing_time_skew_secs)?;

    Ok(CounterOrderParams {
        listing_time: times.listing_time,
        expiration_time: times.expiration_time,
        fee_recipient: flip_fee_recipient(listing.fee_recipient, config.fee_recipient),
        salt: random_salt(),
    })
}

/// Exactly one side of a matched pair carries the marketplace fee recipient
fn flip_fee_recipient(listing_recipient: Address, marketplace_recipient: Address) -> Address {
    if listing_recipient == Address::ZERO {
        marketplace_recipient
    } else {
        Address::ZERO
    }
}

/// Pseudorandom salt for replay safety; no cryptographic requirement
pub fn random_salt() -> U256 {
    let mut rng = rand::thread_rng();
    let mut limbs = [0u64; 4];
    for limb in &mut limbs {
        *limb = rng.next_u64();
    }
    U256::from_limbs(limbs)
}

fn rejected(message: impl Into<String>) -> ProtocolError {
    ProtocolError::ValidationRejected(message.into())
}
