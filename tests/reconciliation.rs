//! End-to-end reconciliation scenario.
//!
//! Park "Yellow Hills" has a waiting-list row with visit date 2024-01-01
//! at 09:00 and two active rows for 2024-06-01 at 08:00, one of which
//! checked in at 08:05. A pass run at 10:00 on 2024-06-01 purges the
//! waiting-list row, cancels the no-show with reason "Did not arrive",
//! leaves the checked-in row alone, and tells connected clients about the
//! maintenance first.

mod common;

use chrono::NaiveDate;
use common::{booking_row, init_logging, yellow_hills_row, RecordingNotifier, ScriptedStorage};
use parkwell::{
    ConnectionHandle, ConnectionRegistry, EnvelopeKind, Notice, NotificationEvent, Reconciler,
    RecurringScheduler,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn run_at_ten() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

#[test]
fn yellow_hills_scenario() {
    init_logging();

    let storage = Arc::new(ScriptedStorage::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let registry = Arc::new(ConnectionRegistry::new());

    // One interactive client is attached
    let (tx, mut client_rx) = mpsc::unbounded_channel();
    registry
        .register(parkwell::ConnectionId::new(), ConnectionHandle::new(tx))
        .unwrap();

    let reconciler = Reconciler::new(storage.clone(), registry.clone(), notifier.clone());

    // --- Waiting-list sweep ---
    storage.script_select(vec![yellow_hills_row()]);
    storage.script_select(vec![booking_row(
        1,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        None,
    )]);

    let report = reconciler.sweep_waiting_lists(run_at_ten()).unwrap();
    assert_eq!(report.rows_moved, 1);
    assert_eq!(report.notices_delivered, 1);

    let issued = storage.issued();
    assert!(issued
        .iter()
        .any(|sql| sql == "DELETE FROM yellow_hills_waiting_list WHERE id = 1;"));

    // The client saw a maintenance notice
    let env = client_rx.try_recv().unwrap();
    assert_eq!(env.kind, EnvelopeKind::ServerNotice);
    assert_eq!(env.notice, Some(Notice::MaintenanceInProgress));

    // --- Active-table sweep ---
    let visit_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let visit_time = chrono::NaiveTime::from_hms_opt(8, 0, 0).unwrap();
    let entry = visit_date.and_hms_opt(8, 5, 0).unwrap();

    storage.script_select(vec![yellow_hills_row()]);
    storage.script_select(vec![
        booking_row(41, visit_date, visit_time, None),
        booking_row(42, visit_date, visit_time, Some(entry)),
    ]);

    let report = reconciler.sweep_active_bookings(run_at_ten()).unwrap();
    assert_eq!(report.rows_moved, 1);

    let issued = storage.issued();
    assert!(issued
        .iter()
        .any(|sql| sql == "DELETE FROM yellow_hills_active_bookings WHERE id = 41;"));
    assert!(issued
        .iter()
        .any(|sql| sql.starts_with("INSERT INTO yellow_hills_cancelled_bookings ")
            && sql.contains("'Did not arrive'")));
    // The checked-in booking was never touched
    assert!(!issued.iter().any(|sql| sql.contains("id = 42")));

    // Cancellation notification went to the no-show's contact
    let sent = notifier.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].0,
        NotificationEvent::Cancelled {
            reason: "Did not arrive".into()
        }
    );
    assert_eq!(sent[0].1.contact_email, "ana@example.com");

    // Both passes committed, nothing rolled back
    let (begun, committed, rolled_back) = storage.counts();
    assert_eq!((begun, committed, rolled_back), (2, 2, 0));
}

#[test]
fn scheduled_jobs_run_both_sweeps() {
    init_logging();

    let storage = Arc::new(ScriptedStorage::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let registry = Arc::new(ConnectionRegistry::new());
    let reconciler = Arc::new(Reconciler::new(
        storage.clone(),
        registry,
        notifier,
    ));

    // No parks scripted: both passes are no-ops but still transact
    let scheduler = RecurringScheduler::new(Duration::from_secs(3600));
    reconciler.register_jobs(&scheduler);
    assert_eq!(scheduler.stats().job_count, 2);

    scheduler.tick_now();
    scheduler.shutdown();

    let (begun, committed, rolled_back) = storage.counts();
    assert_eq!((begun, committed, rolled_back), (2, 2, 0));
    // Each sweep fetched the park list
    assert_eq!(
        storage
            .issued()
            .iter()
            .filter(|sql| *sql == "SELECT * FROM parks;")
            .count(),
        2
    );
}
