//! Inventory ledger tests
//!
//! Tests for the weighted-average-cost stock ledger:
//! - Valuation accuracy across purchase sequences
//! - Reservation/release/consumption balance rules
//! - The total-value invariant under arbitrary transaction streams

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{StockPosition, TransactionDirection, TransactionKind};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn seeded(quantity: i32, unit_cost: &str) -> StockPosition {
    StockPosition::empty()
        .apply(
            TransactionDirection::In,
            TransactionKind::Initial,
            quantity,
            Some(dec(unit_cost)),
        )
        .unwrap()
        .position
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Receiving at two different costs blends the average
    #[test]
    fn test_weighted_average_across_purchases() {
        // 10 @ 100.00 then 5 @ 130.00 -> 15 on hand, avg 110.00
        let position = seeded(10, "100.00");
        let applied = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Purchase,
                5,
                Some(dec("130.00")),
            )
            .unwrap();

        assert_eq!(applied.position.on_hand, 15);
        assert_eq!(applied.position.average_cost, dec("110.00"));
        assert_eq!(applied.position.total_value, dec("1650.00"));
        assert_eq!(applied.avg_cost_before, dec("100.00"));
        assert_eq!(applied.avg_cost_after, dec("110.00"));
    }

    /// A purchase into a zero balance takes its cost directly
    #[test]
    fn test_purchase_into_empty_position() {
        let applied = StockPosition::empty()
            .apply(
                TransactionDirection::In,
                TransactionKind::Purchase,
                8,
                Some(dec("42.50")),
            )
            .unwrap();

        assert_eq!(applied.position.average_cost, dec("42.50"));
        assert_eq!(applied.position.total_value, dec("340.00"));
    }

    /// Purchases without a unit cost are rejected
    #[test]
    fn test_purchase_requires_unit_cost() {
        let result = StockPosition::empty().apply(
            TransactionDirection::In,
            TransactionKind::Purchase,
            5,
            None,
        );
        assert!(result.is_err());
    }

    /// Reserving moves quantity out of the available pool only
    #[test]
    fn test_reservation_does_not_touch_valuation() {
        let position = seeded(20, "60.00");
        let applied = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                7,
                None,
            )
            .unwrap();

        assert_eq!(applied.position.on_hand, 20);
        assert_eq!(applied.position.reserved, 7);
        assert_eq!(applied.position.available(), 13);
        assert_eq!(applied.position.average_cost, dec("60.00"));
        assert_eq!(applied.position.total_value, dec("1200.00"));
    }

    /// Reserving more than is available fails
    #[test]
    fn test_reservation_beyond_available_rejected() {
        let position = seeded(5, "10.00");
        let result = position.apply(
            TransactionDirection::In,
            TransactionKind::Reservation,
            6,
            None,
        );
        assert!(result.is_err());
    }

    /// Consumption removes reserved stock at the carried cost basis
    #[test]
    fn test_consumption_keeps_cost_basis() {
        let mut position = seeded(10, "100.00");
        position = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                4,
                None,
            )
            .unwrap()
            .position;

        let applied = position
            .apply(
                TransactionDirection::Out,
                TransactionKind::Consumption,
                4,
                None,
            )
            .unwrap();

        assert_eq!(applied.position.on_hand, 6);
        assert_eq!(applied.position.reserved, 0);
        assert_eq!(applied.position.average_cost, dec("100.00"));
        assert_eq!(applied.position.total_value, dec("600.00"));
    }

    /// Consuming without a matching reservation is rejected
    #[test]
    fn test_consumption_requires_reservation() {
        let position = seeded(10, "100.00");
        let result = position.apply(
            TransactionDirection::Out,
            TransactionKind::Consumption,
            1,
            None,
        );
        assert!(result.is_err());
    }

    /// Releasing more than is reserved is rejected
    #[test]
    fn test_release_cannot_go_negative() {
        let position = seeded(10, "100.00");
        let result =
            position.apply(TransactionDirection::Out, TransactionKind::Release, 1, None);
        assert!(result.is_err());
    }

    /// An outbound adjustment cannot break open reservations
    #[test]
    fn test_out_adjustment_respects_reservations() {
        let mut position = seeded(10, "50.00");
        position = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Reservation,
                8,
                None,
            )
            .unwrap()
            .position;

        // Only 2 are free; removing 3 would leave reservations unbacked
        let result = position.apply(
            TransactionDirection::Out,
            TransactionKind::Adjustment,
            3,
            None,
        );
        assert!(result.is_err());

        let ok = position.apply(
            TransactionDirection::Out,
            TransactionKind::Adjustment,
            2,
            None,
        );
        assert!(ok.is_ok());
    }

    /// An uncosted inbound adjustment is valued at the current average
    #[test]
    fn test_uncosted_in_adjustment_carries_average() {
        let position = seeded(10, "25.00");
        let applied = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Adjustment,
                2,
                None,
            )
            .unwrap();

        assert_eq!(applied.position.on_hand, 12);
        assert_eq!(applied.position.average_cost, dec("25.00"));
        assert_eq!(applied.position.total_value, dec("300.00"));
    }

    /// Direction/kind pairs outside the allowed table are rejected
    #[test]
    fn test_direction_kind_pairing() {
        let position = seeded(10, "10.00");

        // RESERVATION is inbound only
        assert!(position
            .apply(
                TransactionDirection::Out,
                TransactionKind::Reservation,
                1,
                None
            )
            .is_err());
        // PURCHASE is inbound only
        assert!(position
            .apply(
                TransactionDirection::Out,
                TransactionKind::Purchase,
                1,
                Some(dec("5.00"))
            )
            .is_err());
        // RELEASE is outbound only
        assert!(position
            .apply(TransactionDirection::In, TransactionKind::Release, 1, None)
            .is_err());
    }

    /// The audit fields mirror the transition
    #[test]
    fn test_audit_fields_match_transition() {
        let position = seeded(10, "100.00");
        let applied = position
            .apply(
                TransactionDirection::In,
                TransactionKind::Purchase,
                10,
                Some(dec("120.00")),
            )
            .unwrap();

        assert_eq!(applied.balance_before, 10);
        assert_eq!(applied.balance_after, 20);
        assert_eq!(applied.value_before, dec("1000.00"));
        assert_eq!(applied.value_after, dec("2200.00"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// total_value always equals on_hand * average_cost after any
    /// accepted sequence of purchases, reservations, and consumptions
    #[test]
    fn prop_total_value_consistency(
        seeds in prop::collection::vec((1..50i32, 1..500i64), 1..8),
        reserve_then_consume in prop::collection::vec(1..10i32, 0..8),
    ) {
        let mut position = StockPosition::empty();

        for (qty, cents) in seeds {
            let cost = Decimal::new(cents, 2);
            position = position
                .apply(TransactionDirection::In, TransactionKind::Purchase, qty, Some(cost))
                .unwrap()
                .position;
            prop_assert!(position.is_consistent());
        }

        for qty in reserve_then_consume {
            if qty > position.available() {
                continue;
            }
            position = position
                .apply(TransactionDirection::In, TransactionKind::Reservation, qty, None)
                .unwrap()
                .position;
            prop_assert!(position.is_consistent());

            position = position
                .apply(TransactionDirection::Out, TransactionKind::Consumption, qty, None)
                .unwrap()
                .position;
            prop_assert!(position.is_consistent());
        }
    }

    /// Reserve then release always restores the starting position
    #[test]
    fn prop_reserve_release_round_trip(
        on_hand in 1..100i32,
        cents in 1..10_000i64,
        reserve in 1..100i32,
    ) {
        prop_assume!(reserve <= on_hand);

        let start = StockPosition::empty()
            .apply(
                TransactionDirection::In,
                TransactionKind::Initial,
                on_hand,
                Some(Decimal::new(cents, 2)),
            )
            .unwrap()
            .position;

        let held = start
            .apply(TransactionDirection::In, TransactionKind::Reservation, reserve, None)
            .unwrap()
            .position;
        let released = held
            .apply(TransactionDirection::Out, TransactionKind::Release, reserve, None)
            .unwrap()
            .position;

        prop_assert_eq!(released, start);
    }

    /// Consumption never changes the average cost
    #[test]
    fn prop_consumption_preserves_average_cost(
        on_hand in 2..100i32,
        cents in 1..10_000i64,
        consume in 1..100i32,
    ) {
        prop_assume!(consume < on_hand);

        let cost = Decimal::new(cents, 2);
        let mut position = StockPosition::empty()
            .apply(TransactionDirection::In, TransactionKind::Initial, on_hand, Some(cost))
            .unwrap()
            .position;

        position = position
            .apply(TransactionDirection::In, TransactionKind::Reservation, consume, None)
            .unwrap()
            .position;
        position = position
            .apply(TransactionDirection::Out, TransactionKind::Consumption, consume, None)
            .unwrap()
            .position;

        prop_assert_eq!(position.average_cost, cost);
        prop_assert_eq!(position.on_hand, on_hand - consume);
    }

    /// Rejected transactions leave the position untouched
    #[test]
    fn prop_rejection_has_no_effect(
        on_hand in 0..20i32,
        over in 1..50i32,
    ) {
        let position = if on_hand > 0 {
            StockPosition::empty()
                .apply(
                    TransactionDirection::In,
                    TransactionKind::Initial,
                    on_hand,
                    Some(Decimal::new(100, 2)),
                )
                .unwrap()
                .position
        } else {
            StockPosition::empty()
        };

        let result = position.apply(
            TransactionDirection::In,
            TransactionKind::Reservation,
            on_hand + over,
            None,
        );
        prop_assert!(result.is_err());
        // apply takes &self, so the original is unchanged by construction;
        // assert the invariant still holds on it
        prop_assert!(position.is_consistent());
    }
}
