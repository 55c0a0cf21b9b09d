//! Listing normalization into candidate orders

use alloy_primitives::Address;
use nftsniper_core::{parse_base_units, CandidateOrder};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Typed view over the listing fields matching and execution need. The rest
/// of the listing stays in the raw payload.
#[derive(Debug, Clone, Deserialize)]
struct ListingView {
    #[serde(default)]
    order_hash: Option<String>,
    #[serde(default)]
    side: Option<u8>,
    #[serde(default)]
    current_price: Option<String>,
    #[serde(default)]
    expiration_time: Option<u64>,
    #[serde(default)]
    maker: Option<PartyRef>,
    #[serde(default)]
    fee_recipient: Option<PartyRef>,
}

#[derive(Debug, Clone, Deserialize)]
struct PartyRef {
    #[serde(default)]
    address: Option<String>,
}

/// Normalize the raw orders of one asset, keeping only well-formed sell-side
/// listings.
pub fn candidates_from_orders(orders: Vec<Value>, token_id: &str) -> Vec<CandidateOrder> {
    orders
        .into_iter()
        .filter_map(|order| candidate_from_listing(order, token_id))
        .collect()
}

/// Normalize a single raw listing. Buy-side offers and listings missing a
/// usable price or seller are dropped.
pub fn candidate_from_listing(listing: Value, token_id: &str) -> Option<CandidateOrder> {
    let view: ListingView = match serde_json::from_value(listing.clone()) {
        Ok(view) => view,
        Err(e) => {
            warn!(token_id = %token_id, error = %e, "Skipping malformed listing");
            return None;
        }
    };

    // Only sell-side orders are purchasable
    if view.side != Some(1) {
        return None;
    }

    let raw_price = view.current_price?;
    let price = match parse_base_units(&raw_price) {
        Ok(price) => price,
        Err(e) => {
            warn!(token_id = %token_id, price = %raw_price, error = %e, "Skipping listing with unusable price");
            return None;
        }
    };

    let seller = match view.maker.and_then(|m| m.address).map(|a| parse_address(&a)) {
        Some(Some(address)) => address,
        _ => {
            warn!(token_id = %token_id, "Skipping listing without a seller address");
            return None;
        }
    };

    let fee_recipient = view
        .fee_recipient
        .and_then(|f| f.address)
        .and_then(|a| parse_address(&a))
        .unwrap_or(Address::ZERO);

    let listing_id = match view.order_hash {
        Some(hash) if !hash.is_empty() => hash,
        _ => token_id.to_string(),
    };

    Some(CandidateOrder {
        listing_id,
        seller,
        price,
        expires_at: view.expiration_time.unwrap_or(0),
        fee_recipient,
        raw_payload: listing,
    })
}

fn parse_address(raw: &str) -> Option<Address> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use serde_json::json;

    fn sell_listing() -> Value {
        json!({
            "order_hash": "0xabc123",
            "side": 1,
            "current_price": "250000000000000000",
            "expiration_time": 1700000000u64,
            "maker": { "address": "0x00000000000000000000000000000000000000aa" },
            "fee_recipient": { "address": "0x00000000000000000000000000000000000000bb" }
        })
    }

    #[test]
    fn test_sell_listing_is_normalized() {
        let candidate = candidate_from_listing(sell_listing(), "42").unwrap();
        assert_eq!(candidate.listing_id, "0xabc123");
        assert_eq!(candidate.price, U256::from(250_000_000_000_000_000u64));
        assert_eq!(candidate.expires_at, 1_700_000_000);
        assert_eq!(
            candidate.seller,
            "0x00000000000000000000000000000000000000aa"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(
            candidate.fee_recipient,
            "0x00000000000000000000000000000000000000bb"
                .parse::<Address>()
                .unwrap()
        );
        assert_eq!(candidate.raw_payload["side"], 1);
    }

    #[test]
    fn test_buy_side_offers_are_dropped() {
        let mut listing = sell_listing();
        listing["side"] = json!(0);
        assert!(candidate_from_listing(listing, "42").is_none());
    }

    #[test]
    fn test_fractional_price_strings_are_truncated() {
        let mut listing = sell_listing();
        listing["current_price"] = json!("250000000000000000.000000000000000000");
        let candidate = candidate_from_listing(listing, "42").unwrap();
        assert_eq!(candidate.price, U256::from(250_000_000_000_000_000u64));
    }

    #[test]
    fn test_unusable_price_drops_the_listing() {
        let mut listing = sell_listing();
        listing["current_price"] = json!("not-a-number");
        assert!(candidate_from_listing(listing, "42").is_none());

        let mut listing = sell_listing();
        listing["current_price"] = Value::Null;
        assert!(candidate_from_listing(listing, "42").is_none());
    }

    #[test]
    fn test_missing_seller_drops_the_listing() {
        let mut listing = sell_listing();
        listing["maker"] = Value::Null;
        assert!(candidate_from_listing(listing, "42").is_none());
    }

    #[test]
    fn test_missing_expiration_means_never_expires() {
        let mut listing = sell_listing();
        listing.as_object_mut().unwrap().remove("expiration_time");
        let candidate = candidate_from_listing(listing, "42").unwrap();
        assert_eq!(candidate.expires_at, 0);
    }

    #[test]
    fn test_missing_fee_recipient_becomes_zero() {
        let mut listing = sell_listing();
        listing["fee_recipient"] = Value::Null;
        let candidate = candidate_from_listing(listing, "42").unwrap();
        assert_eq!(candidate.fee_recipient, Address::ZERO);
    }

    #[test]
    fn test_listing_id_falls_back_to_token_id() {
        let mut listing = sell_listing();
        listing.as_object_mut().unwrap().remove("order_hash");
        let candidate = candidate_from_listing(listing, "42").unwrap();
        assert_eq!(candidate.listing_id, "42");
    }

    #[test]
    fn test_normalizes_only_well_formed_sell_orders() {
        let orders = vec![
            sell_listing(),
            json!({ "side": 0, "current_price": "1" }),
            json!({ "side": "sell" }),
        ];
        let candidates = candidates_from_orders(orders, "42");
        assert_eq!(candidates.len(), 1);
    }
}
