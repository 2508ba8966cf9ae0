//! Tracking reconciliation tests
//!
//! Tests for the sync decision logic:
//! - An unchanged raw status is a no-op
//! - A delivered order never regresses, whatever the carrier says
//! - Delivered/failed parcels dispatch to the right transition
//! - Re-syncing against an unchanged carrier leaves the order as-is

use proptest::prelude::*;

use shared::{OrderStatus, SyncAction};

const ACTIVE_STATUSES: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Cancelled,
];

fn status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(
        [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
        .to_vec(),
    )
}

fn mapped_strategy() -> impl Strategy<Value = Option<OrderStatus>> {
    prop::sample::select(vec![
        None,
        Some(OrderStatus::Confirmed),
        Some(OrderStatus::Shipped),
        Some(OrderStatus::Delivered),
        Some(OrderStatus::Cancelled),
    ])
}

fn raw_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "En préparation".to_string(),
        "Sorti en livraison".to_string(),
        "Livré".to_string(),
        "Retourné au vendeur".to_string(),
    ])
}

/// Mirror of what a sync persists: the order status a dispatched action
/// settles on, and the stored raw mirror after the poll.
fn settle(
    status: OrderStatus,
    stored_raw: Option<String>,
    fetched_raw: &str,
    action: SyncAction,
) -> (OrderStatus, Option<String>) {
    match action {
        SyncAction::Unchanged => (status, stored_raw),
        SyncAction::StatusRecorded => (status, Some(fetched_raw.to_string())),
        SyncAction::Delivered => (OrderStatus::Delivered, Some(fetched_raw.to_string())),
        SyncAction::Failed => (OrderStatus::Cancelled, Some(fetched_raw.to_string())),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// The carrier reporting the same string again does nothing
    #[test]
    fn test_unchanged_raw_status_is_noop() {
        let action = SyncAction::classify(
            OrderStatus::Shipped,
            Some("Sorti en livraison"),
            "Sorti en livraison",
            Some(OrderStatus::Shipped),
        );
        assert_eq!(action, SyncAction::Unchanged);
    }

    /// A delivered order ignores every carrier status
    #[test]
    fn test_delivered_never_regresses() {
        for mapped in [
            None,
            Some(OrderStatus::Shipped),
            Some(OrderStatus::Cancelled),
        ] {
            let action = SyncAction::classify(
                OrderStatus::Delivered,
                Some("Livré"),
                "Retourné au vendeur",
                mapped,
            );
            assert_eq!(action, SyncAction::Unchanged);
        }
    }

    /// A carrier-confirmed delivery dispatches the delivery transition
    #[test]
    fn test_delivery_dispatch() {
        let action = SyncAction::classify(
            OrderStatus::Shipped,
            Some("Sorti en livraison"),
            "Livré",
            Some(OrderStatus::Delivered),
        );
        assert_eq!(action, SyncAction::Delivered);
    }

    /// A returned parcel dispatches the failure transition
    #[test]
    fn test_failure_dispatch() {
        let action = SyncAction::classify(
            OrderStatus::Shipped,
            Some("Sorti en livraison"),
            "Retourné au vendeur",
            Some(OrderStatus::Cancelled),
        );
        assert_eq!(action, SyncAction::Failed);
    }

    /// Intermediate and unrecognized carrier states only move the mirror
    #[test]
    fn test_intermediate_states_only_record() {
        for mapped in [None, Some(OrderStatus::Confirmed), Some(OrderStatus::Shipped)] {
            let action = SyncAction::classify(
                OrderStatus::Shipped,
                Some("En préparation"),
                "Sorti en livraison",
                mapped,
            );
            assert_eq!(action, SyncAction::StatusRecorded);
        }
    }

    /// The very first poll has no stored mirror and still records
    #[test]
    fn test_first_poll_records() {
        let action = SyncAction::classify(
            OrderStatus::Shipped,
            None,
            "En préparation",
            Some(OrderStatus::Confirmed),
        );
        assert_eq!(action, SyncAction::StatusRecorded);
    }

    /// Two polls against an unchanged carrier: the second is a no-op
    #[test]
    fn test_repeated_sync_is_idempotent() {
        for status in ACTIVE_STATUSES {
            let first = SyncAction::classify(status, None, "Sorti en livraison", None);
            let (status, stored) = settle(status, None, "Sorti en livraison", first);
            let second = SyncAction::classify(
                status,
                stored.as_deref(),
                "Sorti en livraison",
                None,
            );
            assert_eq!(second, SyncAction::Unchanged);
        }
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Whatever the first poll did, a second poll with the same upstream
    /// status leaves the order exactly where the first left it
    #[test]
    fn prop_second_sync_is_noop(
        status in status_strategy(),
        stored in prop::option::of(raw_strategy()),
        fetched in raw_strategy(),
        mapped in mapped_strategy(),
    ) {
        let first = SyncAction::classify(status, stored.as_deref(), &fetched, mapped);
        let (status_after, stored_after) = settle(status, stored, &fetched, first);

        let second = SyncAction::classify(
            status_after,
            stored_after.as_deref(),
            &fetched,
            mapped,
        );
        prop_assert_eq!(second, SyncAction::Unchanged);

        let (final_status, final_stored) =
            settle(status_after, stored_after.clone(), &fetched, second);
        prop_assert_eq!(final_status, status_after);
        prop_assert_eq!(final_stored, stored_after);
    }

    /// DELIVERED absorbs every poll
    #[test]
    fn prop_delivered_absorbs(
        stored in prop::option::of(raw_strategy()),
        fetched in raw_strategy(),
        mapped in mapped_strategy(),
    ) {
        let action = SyncAction::classify(
            OrderStatus::Delivered,
            stored.as_deref(),
            &fetched,
            mapped,
        );
        prop_assert_eq!(action, SyncAction::Unchanged);
    }

    /// An unchanged raw status never dispatches a transition
    #[test]
    fn prop_unchanged_raw_never_dispatches(
        status in status_strategy(),
        raw in raw_strategy(),
        mapped in mapped_strategy(),
    ) {
        let action = SyncAction::classify(status, Some(&raw), &raw, mapped);
        prop_assert_eq!(action, SyncAction::Unchanged);
    }
}
