//! Lot ledger tests
//!
//! Tests for the quantity ledger rules:
//! - Item quantity equals the sum of its lot quantities
//! - Reductions never leave a zero-quantity lot behind
//! - Consuming the last lot retires the item
//! - Expiry window arithmetic

use chrono::NaiveDate;
use proptest::prelude::*;

// ============================================================================
// Ledger Simulation Helpers
// ============================================================================

/// Outcome of reducing one lot
#[derive(Debug, PartialEq, Eq)]
enum ReduceOutcome {
    /// Lot shrank to this quantity
    Remaining(i32),
    /// Lot was fully consumed and removed
    Consumed,
}

/// Apply the reduce policy to a single lot: taking the full quantity (or
/// more) removes the lot, anything less shrinks it.
fn reduce(lot_quantity: i32, requested: i32) -> Result<(ReduceOutcome, i32), &'static str> {
    if requested <= 0 {
        return Err("Reduction quantity must be positive");
    }
    if requested >= lot_quantity {
        Ok((ReduceOutcome::Consumed, lot_quantity))
    } else {
        Ok((ReduceOutcome::Remaining(lot_quantity - requested), requested))
    }
}

/// Simulate a sequence of reductions over a set of lots, tracking the
/// cached item quantity the way the service does.
fn simulate_reductions(mut lots: Vec<i32>, reductions: &[(usize, i32)]) -> (Vec<i32>, i32) {
    let mut item_quantity: i32 = lots.iter().sum();

    for &(index, requested) in reductions {
        if index >= lots.len() {
            continue;
        }
        if let Ok((outcome, debited)) = reduce(lots[index], requested) {
            item_quantity -= debited;
            match outcome {
                ReduceOutcome::Consumed => {
                    lots.remove(index);
                }
                ReduceOutcome::Remaining(q) => {
                    lots[index] = q;
                }
            }
        }
    }

    (lots, item_quantity)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn partial_reduction_shrinks_the_lot() {
        let (outcome, debited) = reduce(10, 4).unwrap();
        assert_eq!(outcome, ReduceOutcome::Remaining(6));
        assert_eq!(debited, 4);
    }

    #[test]
    fn exact_reduction_consumes_the_lot() {
        let (outcome, debited) = reduce(10, 10).unwrap();
        assert_eq!(outcome, ReduceOutcome::Consumed);
        assert_eq!(debited, 10);
    }

    #[test]
    fn over_reduction_debits_only_what_the_lot_held() {
        let (outcome, debited) = reduce(3, 100).unwrap();
        assert_eq!(outcome, ReduceOutcome::Consumed);
        assert_eq!(debited, 3);
    }

    #[test]
    fn nonpositive_reductions_are_rejected() {
        assert!(reduce(5, 0).is_err());
        assert!(reduce(5, -2).is_err());
    }

    #[test]
    fn consuming_every_lot_leaves_a_zero_item() {
        let (lots, quantity) = simulate_reductions(vec![2, 3], &[(0, 2), (0, 3)]);
        assert!(lots.is_empty());
        assert_eq!(quantity, 0);
    }

    #[test]
    fn expiry_window_includes_today_and_the_cutoff() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let cutoff = today + chrono::Duration::days(7);

        let expires_today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let expires_on_cutoff = NaiveDate::from_ymd_opt(2026, 9, 6).unwrap();
        let expires_after = NaiveDate::from_ymd_opt(2026, 9, 7).unwrap();

        assert!(expires_today <= cutoff);
        assert!(expires_on_cutoff <= cutoff);
        assert!(expires_after > cutoff);
    }

    #[test]
    fn days_until_expiry_can_be_negative_for_expired_lots() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        let expired = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        assert_eq!((expired - today).num_days(), -3);

        let fresh = NaiveDate::from_ymd_opt(2026, 9, 2).unwrap();
        assert_eq!((fresh - today).num_days(), 3);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        /// The cached item quantity always equals the sum of surviving lots.
        #[test]
        fn item_quantity_stays_equal_to_lot_sum(
            lots in proptest::collection::vec(1i32..=50, 0..6),
            reductions in proptest::collection::vec((0usize..6, 1i32..=60), 0..10),
        ) {
            let (remaining, item_quantity) = simulate_reductions(lots, &reductions);
            let lot_sum: i32 = remaining.iter().sum();
            prop_assert_eq!(item_quantity, lot_sum);
        }

        /// No surviving lot ever holds a non-positive quantity.
        #[test]
        fn lots_are_never_left_at_zero(
            lots in proptest::collection::vec(1i32..=50, 0..6),
            reductions in proptest::collection::vec((0usize..6, 1i32..=60), 0..10),
        ) {
            let (remaining, _) = simulate_reductions(lots, &reductions);
            prop_assert!(remaining.iter().all(|&q| q > 0));
        }

        /// A single reduction debits exactly min(requested, held).
        #[test]
        fn debit_is_never_more_than_the_lot_held(
            held in 1i32..=1000,
            requested in 1i32..=2000,
        ) {
            let (_, debited) = reduce(held, requested).unwrap();
            prop_assert_eq!(debited, requested.min(held));
        }
    }
}
