//! Candidate selection against the price ceiling.
//!
//! Pure integer arithmetic throughout; marketplace prices routinely exceed
//! what a 64-bit float can represent, so floats never enter this path.

use crate::types::{CandidateOrder, MatchResult};
use alloy_primitives::U256;

/// Select the single best purchasable candidate.
///
/// A candidate survives when it is unexpired (`expires_at == 0` means never)
/// and priced at or below the ceiling. Among survivors the minimum price
/// wins; ties keep the earliest-seen candidate, so the result is stable with
/// respect to upstream ordering.
pub fn select_best(ceiling: U256, now_epoch: u64, candidates: &[CandidateOrder]) -> MatchResult {
    let mut best: Option<&CandidateOrder> = None;

    for candidate in candidates {
        if candidate.expires_at != 0 && candidate.expires_at <= now_epoch {
            continue;
        }
        if candidate.price > ceiling {
            continue;
        }
        match best {
            Some(current) if candidate.price >= current.price => {}
            _ => best = Some(candidate),
        }
    }

    match best {
        Some(order) => MatchResult::Matched(order.clone()),
        None => MatchResult::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    const NOW: u64 = 1_700_000_000;

    fn candidate(id: &str, price: u64, expires_at: u64) -> CandidateOrder {
        CandidateOrder {
            listing_id: id.to_string(),
            seller: Address::ZERO,
            price: U256::from(price),
            expires_at,
            fee_recipient: Address::ZERO,
            raw_payload: serde_json::Value::Null,
        }
    }

    fn matched_id(result: MatchResult) -> String {
        match result {
            MatchResult::Matched(order) => order.listing_id,
            MatchResult::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_empty_input_is_no_match() {
        assert_eq!(select_best(U256::from(100u64), NOW, &[]), MatchResult::NoMatch);
    }

    #[test]
    fn test_picks_cheapest_under_ceiling() {
        let candidates = vec![
            candidate("a", 150, 0),
            candidate("b", 90, 0),
            candidate("c", 95, 0),
        ];
        let result = select_best(U256::from(100u64), NOW, &candidates);
        assert_eq!(matched_id(result), "b");
    }

    #[test]
    fn test_price_equal_to_ceiling_is_accepted() {
        let candidates = vec![candidate("a", 100, 0)];
        let result = select_best(U256::from(100u64), NOW, &candidates);
        assert_eq!(matched_id(result), "a");
    }

    #[test]
    fn test_expired_candidates_are_skipped() {
        let candidates = vec![candidate("a", 90, NOW - 10)];
        assert_eq!(
            select_best(U256::from(100u64), NOW, &candidates),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn test_expiry_at_exactly_now_is_expired() {
        let candidates = vec![candidate("a", 90, NOW)];
        assert_eq!(
            select_best(U256::from(100u64), NOW, &candidates),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn test_zero_expiry_never_expires() {
        let candidates = vec![candidate("a", 90, 0)];
        let result = select_best(U256::from(100u64), NOW, &candidates);
        assert_eq!(matched_id(result), "a");
    }

    #[test]
    fn test_future_expiry_survives() {
        let candidates = vec![candidate("a", 90, NOW + 60)];
        let result = select_best(U256::from(100u64), NOW, &candidates);
        assert_eq!(matched_id(result), "a");
    }

    #[test]
    fn test_equal_prices_keep_first_seen() {
        let candidates = vec![
            candidate("first", 90, 0),
            candidate("second", 90, 0),
            candidate("third", 90, 0),
        ];
        let result = select_best(U256::from(100u64), NOW, &candidates);
        assert_eq!(matched_id(result), "first");
    }

    #[test]
    fn test_all_over_ceiling_is_no_match() {
        let candidates = vec![candidate("a", 101, 0), candidate("b", 500, 0)];
        assert_eq!(
            select_best(U256::from(100u64), NOW, &candidates),
            MatchResult::NoMatch
        );
    }

    #[test]
    fn test_prices_beyond_f64_precision_compare_exactly() {
        // Two prices that differ by one base unit around 2^64
        let base = U256::from(u64::MAX) * U256::from(1_000u64);
        let cheaper = CandidateOrder {
            price: base,
            ..candidate("cheap", 0, 0)
        };
        let dearer = CandidateOrder {
            price: base + U256::from(1u8),
            ..candidate("dear", 0, 0)
        };
        let ceiling = base + U256::from(1u8);
        let result = select_best(ceiling, NOW, &[dearer, cheaper]);
        assert_eq!(matched_id(result), "cheap");
    }
}
