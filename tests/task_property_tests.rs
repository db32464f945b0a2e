//! Property-based tests for task derivation
//!
//! Generates trip sets over the full product of pipeline statuses, CMR steps
//! and invoice statuses and checks that the inbox is ordered, stable,
//! idempotent and consistent with the per-trip rules.

use nexmile::{
    task::{Severity, TaskKind, derive_tasks},
    trip::{
        BillingPipeline, CmrPipeline, CmrStep, InvoiceStatus, LocationDetails, PipelineStatus,
        Trip, TripTask,
    },
};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = PipelineStatus> {
    prop_oneof![
        Just(PipelineStatus::Pending),
        Just(PipelineStatus::Active),
        Just(PipelineStatus::Completed),
        Just(PipelineStatus::Blocked),
        Just(PipelineStatus::Warning),
    ]
}

fn step_strategy() -> impl Strategy<Value = CmrStep> {
    prop_oneof![
        Just(CmrStep::Drafting),
        Just(CmrStep::Uploaded),
        Just(CmrStep::SentToClient),
        Just(CmrStep::Received),
    ]
}

fn invoice_strategy() -> impl Strategy<Value = Option<InvoiceStatus>> {
    prop_oneof![
        Just(None),
        Just(Some(InvoiceStatus::WaitingDocs)),
        Just(Some(InvoiceStatus::Issued)),
        Just(Some(InvoiceStatus::WaitingPayment)),
        Just(Some(InvoiceStatus::Paid)),
    ]
}

fn route(id: &str) -> TripTask {
    TripTask::new(
        &format!("FL-{id}"),
        LocationDetails::new("DE", "20095", "HAMBURG", "01.06"),
        LocationDetails::new("UA", "79000", "LVIV", "03.06"),
        1400.0,
    )
}

/// Strategy to generate a trip set with unique ids in scan order
fn trips_strategy() -> impl Strategy<Value = Vec<Trip>> {
    prop::collection::vec(
        (status_strategy(), step_strategy(), status_strategy(), invoice_strategy()),
        0..12,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (cmr_status, step, billing_status, invoice))| {
                let id = i.to_string();
                let mut billing = BillingPipeline::new(1000.0, "EUR").set_status(billing_status);
                billing.invoice_status = invoice;
                if invoice == Some(InvoiceStatus::Issued) {
                    billing.invoice_id = Some(format!("INV-{i}"));
                }
                Trip::new(&id, "Client")
                    .set_route(route(&id))
                    .set_cmr(CmrPipeline::new().set_status(cmr_status).set_step(step))
                    .set_billing(billing)
            })
            .collect()
    })
}

fn done_trip(id: &str) -> Trip {
    Trip::new(id, "Client")
        .set_route(route(id))
        .set_cmr(
            CmrPipeline::new()
                .set_status(PipelineStatus::Completed)
                .set_step(CmrStep::Received),
        )
        .set_billing(BillingPipeline::new(1.0, "EUR").set_status(PipelineStatus::Completed))
}

// PROPERTY TESTS
proptest! {
    /// Property: the inbox is sorted by severity
    #[test]
    fn prop_tasks_sorted_by_severity(trips in trips_strategy()) {
        let tasks = derive_tasks(&trips, "01/01");
        let severities: Vec<_> = tasks.items().iter().map(|t| t.severity).collect();

        prop_assert!(severities.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Property: within a severity, scan order holds, CMR before billing per trip
    #[test]
    fn prop_ties_keep_scan_order(trips in trips_strategy()) {
        let tasks = derive_tasks(&trips, "01/01");
        let position = |trip_id: &str| trips.iter().position(|t| t.task.id == trip_id);

        for pair in tasks.items().windows(2) {
            if pair[0].severity != pair[1].severity {
                continue;
            }
            let a = (position(&pair[0].trip_id), pair[0].kind == TaskKind::Billing);
            let b = (position(&pair[1].trip_id), pair[1].kind == TaskKind::Billing);
            prop_assert!(a < b, "{:?} should precede {:?}", pair[0].id, pair[1].id);
        }
    }

    /// Property: derivation is a pure function of the trips
    #[test]
    fn prop_derivation_is_idempotent(trips in trips_strategy()) {
        prop_assert_eq!(derive_tasks(&trips, "01/01"), derive_tasks(&trips, "01/01"));
    }

    /// Property: each trip yields at most one CMR and one billing item, and
    /// completed pipelines yield none
    #[test]
    fn prop_per_trip_item_bounds(trips in trips_strategy()) {
        let tasks = derive_tasks(&trips, "01/01");

        for trip in &trips {
            let of_trip: Vec<_> = tasks.items().iter().filter(|t| t.trip_id == trip.task.id).collect();
            let cmr = of_trip.iter().filter(|t| t.kind == TaskKind::Cmr).count();
            let billing = of_trip.iter().filter(|t| t.kind == TaskKind::Billing).count();

            prop_assert!(cmr <= 1 && billing <= 1);
            if trip.cmr.status == PipelineStatus::Completed {
                prop_assert_eq!(cmr, 0);
            }
            if trip.billing.status == PipelineStatus::Completed {
                prop_assert_eq!(billing, 0);
            }
        }
    }

    /// Property: fully completed trips never produce work
    #[test]
    fn prop_completed_trips_are_all_clear(n in 0usize..10) {
        let trips: Vec<_> = (0..n).map(|i| done_trip(&i.to_string())).collect();
        prop_assert!(derive_tasks(&trips, "01/01").is_all_clear());
    }
}

/// One trip per severity, fed in reverse, comes back Critical, Warning, Info
#[test]
fn severity_order_ignores_input_order() {
    let info = Trip::new("i", "Info Co")
        .set_route(route("i"))
        .set_cmr(
            CmrPipeline::new()
                .set_status(PipelineStatus::Warning)
                .set_step(CmrStep::SentToClient),
        )
        .set_billing(BillingPipeline::new(1.0, "EUR").set_status(PipelineStatus::Completed));
    let warning = Trip::new("w", "Warn Co")
        .set_route(route("w"))
        .set_cmr(done_trip("w").cmr)
        .set_billing(
            BillingPipeline::new(1.0, "EUR")
                .set_status(PipelineStatus::Blocked)
                .set_invoice_status(InvoiceStatus::WaitingDocs),
        );
    let critical = Trip::new("c", "Crit Co")
        .set_route(route("c"))
        .set_cmr(CmrPipeline::new())
        .set_billing(BillingPipeline::new(1.0, "EUR").set_status(PipelineStatus::Completed));

    let tasks = derive_tasks(&[info, warning, critical], "01/01");
    let severities: Vec<_> = tasks.items().iter().map(|t| t.severity).collect();

    assert_eq!(severities, [Severity::Critical, Severity::Warning, Severity::Info]);
}

#[test]
fn empty_trip_set_is_all_clear() {
    let tasks = derive_tasks(&[], "01/01");
    assert!(tasks.is_all_clear());
    assert_eq!(tasks.summary().critical, 0);
}
