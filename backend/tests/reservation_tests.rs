//! Reservation engine tests
//!
//! Tests for the all-or-nothing multi-item hold semantics, expressed over
//! the pure stock arithmetic the engine composes:
//! - One short line fails the whole reservation
//! - Release restores every held line exactly
//! - Ship compensation restores both on-hand and reserved quantities

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{StockPosition, TransactionDirection, TransactionKind};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn stocked(on_hand: i32, cost: &str) -> StockPosition {
    StockPosition::empty()
        .apply(
            TransactionDirection::In,
            TransactionKind::Initial,
            on_hand,
            Some(dec(cost)),
        )
        .unwrap()
        .position
}

/// Reserve every line or none, mirroring the engine's single-transaction
/// behavior: the first failure abandons all earlier holds
fn reserve_all(
    positions: &[StockPosition],
    quantities: &[i32],
) -> Option<Vec<StockPosition>> {
    let mut held = Vec::with_capacity(positions.len());
    for (position, &qty) in positions.iter().zip(quantities) {
        match position.apply(
            TransactionDirection::In,
            TransactionKind::Reservation,
            qty,
            None,
        ) {
            Ok(applied) => held.push(applied.position),
            Err(_) => return None,
        }
    }
    Some(held)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Every line within stock: all holds land
    #[test]
    fn test_reserve_all_lines() {
        let positions = [stocked(10, "100.00"), stocked(5, "250.00")];
        let held = reserve_all(&positions, &[3, 5]).unwrap();

        assert_eq!(held[0].reserved, 3);
        assert_eq!(held[0].available(), 7);
        assert_eq!(held[1].reserved, 5);
        assert_eq!(held[1].available(), 0);
    }

    /// One short line fails the whole order
    #[test]
    fn test_one_short_line_fails_everything() {
        let positions = [stocked(10, "100.00"), stocked(2, "250.00")];
        assert!(reserve_all(&positions, &[3, 5]).is_none());
    }

    /// Releasing the full hold restores the starting position
    #[test]
    fn test_release_restores_position() {
        let start = stocked(10, "100.00");
        let held = start
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                4,
                None,
            )
            .unwrap()
            .position;
        let released = held
            .apply(TransactionDirection::Out, TransactionKind::Release, 4, None)
            .unwrap()
            .position;

        assert_eq!(released, start);
    }

    /// Releasing with nothing outstanding has nothing to apply; the
    /// engine treats an empty outstanding set as a no-op, which over the
    /// arithmetic means the position simply does not change
    #[test]
    fn test_release_with_no_hold_is_rejected_by_arithmetic() {
        let start = stocked(10, "100.00");
        assert!(start
            .apply(TransactionDirection::Out, TransactionKind::Release, 1, None)
            .is_err());
    }

    /// Ship compensation: after consume, an inbound adjustment at the
    /// carried cost plus a fresh reservation restores the held state
    #[test]
    fn test_unconsume_restores_held_state() {
        let held = stocked(10, "100.00")
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                4,
                None,
            )
            .unwrap()
            .position;

        let consumed = held
            .apply(
                TransactionDirection::Out,
                TransactionKind::Consumption,
                4,
                None,
            )
            .unwrap()
            .position;
        assert_eq!(consumed.on_hand, 6);
        assert_eq!(consumed.reserved, 0);

        let restored = consumed
            .apply(
                TransactionDirection::In,
                TransactionKind::Adjustment,
                4,
                Some(consumed.average_cost),
            )
            .unwrap()
            .position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                4,
                None,
            )
            .unwrap()
            .position;

        assert_eq!(restored, held);
    }

    /// Two orders holding the same item cannot over-commit it
    #[test]
    fn test_competing_holds_bounded_by_stock() {
        let mut position = stocked(10, "100.00");
        position = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                6,
                None,
            )
            .unwrap()
            .position;

        // 4 left; a second order wanting 5 must fail
        assert!(position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                5,
                None
            )
            .is_err());
        assert!(position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                4,
                None
            )
            .is_ok());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    // The release-inverse test assumes `qty <= on_hand` per generated line,
    // which discards most multi-line cases; give the runner a larger reject
    // budget so it can still reach the full case count.
    #![proptest_config(ProptestConfig {
        max_global_rejects: 65536,
        ..ProptestConfig::default()
    })]

    /// All-or-nothing: a reservation succeeds exactly when every line fits
    #[test]
    fn prop_all_or_nothing(
        lines in prop::collection::vec((1..50i32, 1..60i32), 1..6),
    ) {
        let positions: Vec<StockPosition> = lines
            .iter()
            .map(|(on_hand, _)| stocked(*on_hand, "100.00"))
            .collect();
        let quantities: Vec<i32> = lines.iter().map(|(_, q)| *q).collect();

        let every_line_fits = lines.iter().all(|(on_hand, qty)| qty <= on_hand);
        let held = reserve_all(&positions, &quantities);

        prop_assert_eq!(held.is_some(), every_line_fits);
        if let Some(held) = held {
            for (position, qty) in held.iter().zip(&quantities) {
                prop_assert_eq!(position.reserved, *qty);
                prop_assert!(position.is_consistent());
            }
        }
    }

    /// Hold then full release is an identity on every line
    #[test]
    fn prop_release_is_inverse_of_reserve(
        lines in prop::collection::vec((1..50i32, 1..50i32), 1..6),
    ) {
        for (on_hand, qty) in lines {
            prop_assume!(qty <= on_hand);
            let start = stocked(on_hand, "75.00");
            let held = start
                .apply(TransactionDirection::In, TransactionKind::Reservation, qty, None)
                .unwrap()
                .position;
            let released = held
                .apply(TransactionDirection::Out, TransactionKind::Release, qty, None)
                .unwrap()
                .position;
            prop_assert_eq!(released, start);
        }
    }

    /// Consume then compensate is an identity on the held position
    #[test]
    fn prop_unconsume_is_inverse_of_consume(
        on_hand in 1..100i32,
        qty in 1..100i32,
        cents in 1..10_000i64,
    ) {
        prop_assume!(qty <= on_hand);

        let held = StockPosition::empty()
            .apply(
                TransactionDirection::In,
                TransactionKind::Initial,
                on_hand,
                Some(Decimal::new(cents, 2)),
            )
            .unwrap()
            .position
            .apply(TransactionDirection::In, TransactionKind::Reservation, qty, None)
            .unwrap()
            .position;

        let consumed = held
            .apply(TransactionDirection::Out, TransactionKind::Consumption, qty, None)
            .unwrap()
            .position;
        let restored = consumed
            .apply(
                TransactionDirection::In,
                TransactionKind::Adjustment,
                qty,
                Some(consumed.average_cost),
            )
            .unwrap()
            .position
            .apply(TransactionDirection::In, TransactionKind::Reservation, qty, None)
            .unwrap()
            .position;

        prop_assert_eq!(restored, held);
    }
}
