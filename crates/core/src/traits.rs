//! Collaborator traits: storage and outbound notification
//!
//! These traits are the seams to the two external collaborators the core
//! consumes. The relational engine and the mail path live behind them, so
//! the core stays testable with scripted fakes and swappable backends.

use crate::error::Result;
use crate::types::{Booking, Park, TransactionHandle};
use crate::value::Row;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Storage collaborator abstraction.
///
/// Every statement handed to this trait was produced by
/// `Envelope::render()` — the core never builds SQL text anywhere else.
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). The exclusive transaction is a
/// mutual-exclusion resource: while a handle is outstanding, a second
/// `begin_exclusive` must block or fail, never interleave.
pub trait Storage: Send + Sync {
    /// Execute a rendered SELECT and return the result rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageFault` if the underlying execute fails.
    fn execute_select(&self, sql: &str) -> Result<Vec<Row>>;

    /// Execute a rendered INSERT/UPDATE/DELETE.
    ///
    /// Returns the statement outcome as a boolean — the protocol carries no
    /// structured error codes for mutations.
    ///
    /// # Errors
    ///
    /// Returns `StorageFault` if the underlying execute fails.
    fn execute_mutation(&self, sql: &str) -> Result<bool>;

    /// Begin an exclusive transaction (auto-commit off).
    ///
    /// # Errors
    ///
    /// Returns `StorageFault` if the transaction cannot be started.
    fn begin_exclusive(&self) -> Result<TransactionHandle>;

    /// Commit the transaction and restore auto-commit.
    ///
    /// # Errors
    ///
    /// Returns `StorageFault` if the commit fails; the pass that issued it
    /// must treat this as a full-pass failure.
    fn commit(&self, txn: TransactionHandle) -> Result<()>;

    /// Roll back every statement issued since `begin_exclusive`.
    ///
    /// # Errors
    ///
    /// Returns `StorageFault` if the rollback itself fails.
    fn rollback(&self, txn: TransactionHandle) -> Result<()>;
}

/// Event that triggers an out-of-band notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationEvent {
    /// Booking moved from the waiting list into the active table
    PromotedFromWaitingList,
    /// Booking confirmed
    Confirmed,
    /// Booking confirmed, reminder suppressed
    ConfirmedWithoutReminder,
    /// Booking cancelled, with a free-text reason
    Cancelled {
        /// Human-readable cancellation reason
        reason: String,
    },
    /// Visit is coming up and the reminder flag is unset
    ReminderDue,
}

/// Structured fields handed to the notification collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingNotice {
    /// Contact address the message goes to
    pub contact_email: String,
    /// Park display name
    pub park_name: String,
    /// Park location (city)
    pub park_city: String,
    /// Visit date
    pub visit_date: NaiveDate,
    /// Visit time
    pub visit_time: NaiveTime,
    /// Number of visitors covered
    pub visitor_count: i64,
    /// Total price
    pub price: f64,
    /// Whether the booking was paid
    pub paid: bool,
}

impl BookingNotice {
    /// Assemble a notice from a booking and its owning park
    pub fn for_booking(booking: &Booking, park: &Park) -> Self {
        BookingNotice {
            contact_email: booking.contact_email.clone(),
            park_name: park.name.clone(),
            park_city: park.city.clone(),
            visit_date: booking.visit_date,
            visit_time: booking.visit_time,
            visitor_count: booking.visitor_count,
            price: booking.price,
            paid: booking.paid,
        }
    }
}

/// Notification collaborator abstraction.
///
/// The core guarantees invocation, not delivery. Callers log and swallow
/// failures — a notification error never aborts the pass that raised it.
pub trait Notifier: Send + Sync {
    /// Send one human-readable message out-of-band.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be handed off.
    fn notify(&self, event: &NotificationEvent, notice: &BookingNotice) -> Result<()>;
}
