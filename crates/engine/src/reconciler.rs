//! Reconciliation passes: the waiting-list and active-table sweeps
//!
//! Each pass runs as: broadcast a maintenance notice to every connected
//! client, fetch the current park list, open one exclusive all-park
//! transaction, move the matching rows per park in fetched order, and
//! commit. Any storage fault rolls back the whole pass; the next timer
//! tick retries it. Only one pass may be in flight at a time — the pass
//! lock is a mutual-exclusion resource, not re-entrant.
//!
//! Every statement a pass issues is an `Internal` envelope rendered through
//! the protocol crate; the engine never writes SQL text by hand.

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use parkwell_core::{
    Booking, BookingId, BookingNotice, Error, NotificationEvent, Notifier, Park, Result,
    SqlValue, Storage, TableRole, PARKS_TABLE,
};
use parkwell_protocol::{ColumnSpec, Comparator, Envelope, Notice, WhereClause};
use parkwell_server::ConnectionRegistry;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::scheduler::RecurringScheduler;

/// Cancellation reason recorded for bookings the no-show sweep moves
pub const NO_SHOW_REASON: &str = "Did not arrive";

/// Outcome of one completed reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Parks scanned this pass
    pub parks_scanned: usize,
    /// Rows purged or moved this pass
    pub rows_moved: usize,
    /// Clients the maintenance notice reached
    pub notices_delivered: usize,
}

/// Runs the periodic reconciliation sweeps over every park's live tables
pub struct Reconciler {
    storage: Arc<dyn Storage>,
    registry: Arc<ConnectionRegistry>,
    notifier: Arc<dyn Notifier>,
    // Held for the duration of a pass; try_lock failure is TransactionConflict
    pass_lock: Mutex<()>,
}

impl Reconciler {
    /// Build a reconciler over the shared collaborators
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<ConnectionRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Reconciler {
            storage,
            registry,
            notifier,
            pass_lock: Mutex::new(()),
        }
    }

    /// Register both sweeps on the recurring scheduler.
    ///
    /// Each tick evaluates "now" freshly; a failed pass is logged and
    /// retried on the next tick, never immediately.
    pub fn register_jobs(self: &Arc<Self>, scheduler: &RecurringScheduler) {
        let this = Arc::clone(self);
        scheduler.register("waiting-list-sweep", move || {
            let now = chrono::Local::now().naive_local();
            if let Err(e) = this.sweep_waiting_lists(now) {
                error!(error = %e, "waiting-list sweep failed; next tick retries");
            }
        });

        let this = Arc::clone(self);
        scheduler.register("active-booking-sweep", move || {
            let now = chrono::Local::now().naive_local();
            if let Err(e) = this.sweep_active_bookings(now) {
                error!(error = %e, "active-booking sweep failed; next tick retries");
            }
        });
    }

    /// Purge waiting-list entries whose slot has already passed.
    ///
    /// An entry whose visit can no longer happen will never be promoted, so
    /// it is deleted rather than left to accumulate.
    ///
    /// # Errors
    ///
    /// Returns `TransactionConflict` if a pass is already in flight, or the
    /// storage fault that rolled this pass back.
    pub fn sweep_waiting_lists(&self, now: NaiveDateTime) -> Result<SweepReport> {
        self.run_pass(now, |this, park, now| this.purge_expired_waiting(park, now))
    }

    /// Cancel active bookings whose visit time passed without any recorded
    /// entry: delete from the active table, insert into the cancelled table
    /// with reason "Did not arrive", and notify the contact.
    ///
    /// # Errors
    ///
    /// Returns `TransactionConflict` if a pass is already in flight, or the
    /// storage fault that rolled this pass back.
    pub fn sweep_active_bookings(&self, now: NaiveDateTime) -> Result<SweepReport> {
        self.run_pass(now, |this, park, now| this.cancel_no_shows(park, now))
    }

    fn run_pass<F>(&self, now: NaiveDateTime, per_park: F) -> Result<SweepReport>
    where
        F: Fn(&Self, &Park, NaiveDateTime) -> Result<usize>,
    {
        let _pass = self
            .pass_lock
            .try_lock()
            .ok_or(Error::TransactionConflict)?;

        // The notice goes out once per run, before any row is read, so
        // interactive clients can show a wait state. It is sent even when
        // the pass turns out to be a no-op.
        let notices_delivered = self
            .registry
            .broadcast(&Envelope::server_notice(Notice::MaintenanceInProgress));
        debug!(notices_delivered, "maintenance notice broadcast");

        let parks = self.fetch_parks()?;
        let txn = self.storage.begin_exclusive()?;

        let mut rows_moved = 0;
        for park in &parks {
            match per_park(self, park, now) {
                Ok(moved) => rows_moved += moved,
                Err(e) => {
                    error!(park = %park.name, error = %e, "pass failed, rolling back");
                    if let Err(rb) = self.storage.rollback(txn) {
                        error!(error = %rb, "rollback failed");
                    }
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.storage.commit(txn) {
            error!(error = %e, "commit failed, rolling back");
            if let Err(rb) = self.storage.rollback(txn) {
                error!(error = %rb, "rollback failed");
            }
            return Err(e);
        }

        Ok(SweepReport {
            parks_scanned: parks.len(),
            rows_moved,
            notices_delivered,
        })
    }

    fn fetch_parks(&self) -> Result<Vec<Park>> {
        let select = Envelope::select(
            vec![PARKS_TABLE.to_string()],
            ColumnSpec::All,
            WhereClause::empty(),
        )
        .into_internal();
        let rows = self.storage.execute_select(&select.render()?)?;
        rows.iter().map(Park::from_row).collect()
    }

    fn purge_expired_waiting(&self, park: &Park, now: NaiveDateTime) -> Result<usize> {
        let table = park.table(TableRole::WaitingList);
        let select = Envelope::select(
            vec![table.clone()],
            ColumnSpec::All,
            expired_slot_clause(now),
        )
        .into_internal();
        let rows = self.storage.execute_select(&select.render()?)?;

        let mut purged = 0;
        for row in &rows {
            let booking = Booking::from_row(row)?;
            self.delete_booking(&table, booking.id)?;
            purged += 1;
        }
        if purged > 0 {
            debug!(park = %park.name, purged, "purged expired waiting-list entries");
        }
        Ok(purged)
    }

    fn cancel_no_shows(&self, park: &Park, now: NaiveDateTime) -> Result<usize> {
        let active = park.table(TableRole::Active);
        let cancelled = park.table(TableRole::Cancelled);
        let select = Envelope::select(
            vec![active.clone()],
            ColumnSpec::All,
            expired_slot_clause(now),
        )
        .into_internal();
        let rows = self.storage.execute_select(&select.render()?)?;

        let mut moved = 0;
        for row in &rows {
            let booking = Booking::from_row(row)?;
            // A recorded timestamp means the visit happened; never cancel it
            if booking.entry_at.is_some() || booking.exit_at.is_some() {
                continue;
            }

            self.delete_booking(&active, booking.id)?;

            let mut values = booking.to_column_values();
            values.push(("cancel_reason".into(), SqlValue::Text(NO_SHOW_REASON.into())));
            let insert = Envelope::insert(cancelled.clone(), values).into_internal();
            if !self.storage.execute_mutation(&insert.render()?)? {
                return Err(Error::StorageFault(format!(
                    "insert of {} into {cancelled} rejected",
                    booking.id
                )));
            }

            let event = NotificationEvent::Cancelled {
                reason: NO_SHOW_REASON.to_string(),
            };
            let notice = BookingNotice::for_booking(&booking, park);
            // Best effort: a notification failure never aborts the pass
            if let Err(e) = self.notifier.notify(&event, &notice) {
                warn!(booking = %booking.id, error = %e, "cancellation notification failed");
            }

            moved += 1;
        }
        if moved > 0 {
            debug!(park = %park.name, moved, "cancelled no-show bookings");
        }
        Ok(moved)
    }

    fn delete_booking(&self, table: &str, id: BookingId) -> Result<()> {
        let delete = Envelope::delete(
            table.to_string(),
            WhereClause::single("id", Comparator::Eq, SqlValue::Int(id.0)),
        )
        .into_internal();
        if !self.storage.execute_mutation(&delete.render()?)? {
            return Err(Error::StorageFault(format!(
                "delete of {id} from {table} rejected"
            )));
        }
        Ok(())
    }
}

/// WHERE clause matching rows whose visit slot has already passed:
/// a visit date strictly before today, or equal to today with a visit time
/// at or before now. The date comparison takes precedence — a past date
/// matches regardless of time-of-day. Relies on AND binding tighter than
/// OR, so the flat clause reads `date < d OR (date = d AND time <= t)`.
fn expired_slot_clause(now: NaiveDateTime) -> WhereClause {
    WhereClause::single("visit_date", Comparator::Lt, SqlValue::Date(now.date()))
        .or("visit_date", Comparator::Eq, SqlValue::Date(now.date()))
        .and("visit_time", Comparator::Le, SqlValue::Time(now.time()))
}
