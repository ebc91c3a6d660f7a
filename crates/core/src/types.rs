//! Domain types for parks and bookings
//!
//! This module defines:
//! - `ParkId` / `BookingId` / `ConnectionId`: identifier newtypes
//! - `VisitType`: individual vs. group visits
//! - `Booking`: one reservation record
//! - `Park`: one park record with capacity limits
//! - `TableRole` and `park_table_name`: the derived per-park table names
//!
//! A booking's status is NOT a stored field. The table currently holding the
//! row (waiting list, active, cancelled) is the state, and `TableRole` names
//! the three roles a park's tables play.

use crate::error::{Error, Result};
use crate::value::{Row, SqlValue};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The global parks table name
pub const PARKS_TABLE: &str = "parks";

/// Unique identifier for a park
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParkId(pub i64);

impl fmt::Display for ParkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "park-{}", self.0)
    }
}

/// Unique identifier for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub i64);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "booking-{}", self.0)
    }
}

/// Identity of one live client connection.
///
/// Registry identity is connection-handle identity, not application-level
/// user identity: two sessions from the same human are distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub uuid::Uuid);

impl ConnectionId {
    /// Mint a fresh connection id
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        ConnectionId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opaque handle for one exclusive storage transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHandle(pub u64);

/// Kind of visit a booking covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitType {
    /// Single visitor or family-sized party
    Individual,
    /// Organized group visit
    Group,
}

impl VisitType {
    /// Canonical storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::Individual => "INDIVIDUAL",
            VisitType::Group => "GROUP",
        }
    }

    /// Parse the canonical storage representation
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "INDIVIDUAL" => Ok(VisitType::Individual),
            "GROUP" => Ok(VisitType::Group),
            other => Err(Error::RowDecode(format!("unknown visit type: {other}"))),
        }
    }
}

/// Role a per-park table plays in the booking lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableRole {
    /// Bookings that could not be allocated a slot yet, ordered by priority
    WaitingList,
    /// Allocated, upcoming or in-progress bookings
    Active,
    /// Terminal: cancelled bookings, with a cancellation reason
    Cancelled,
}

impl TableRole {
    /// Fixed table-name suffix for this role
    pub fn suffix(&self) -> &'static str {
        match self {
            TableRole::WaitingList => "_waiting_list",
            TableRole::Active => "_active_bookings",
            TableRole::Cancelled => "_cancelled_bookings",
        }
    }
}

/// Derive the physical table name for a park and role.
///
/// The rule is fixed by the persisted layout: the park's display name
/// lower-cased, spaces replaced by underscores, plus the role suffix.
/// `"Yellow Hills"` + `Active` becomes `yellow_hills_active_bookings`.
pub fn park_table_name(park_name: &str, role: TableRole) -> String {
    let mut base = park_name.to_lowercase().replace(' ', "_");
    base.push_str(role.suffix());
    base
}

/// One reservation record.
///
/// Consumed and produced by reconciliation; owned by the storage
/// collaborator. Column order of the row form is the struct field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier (primary key in every role table)
    pub id: BookingId,
    /// Date of the visit
    pub visit_date: NaiveDate,
    /// Start time of the visit
    pub visit_time: NaiveTime,
    /// Date the booking was made
    pub booking_date: NaiveDate,
    /// Individual or group visit
    pub visit_type: VisitType,
    /// Number of visitors covered
    pub visitor_count: i64,
    /// Contact name
    pub contact_name: String,
    /// Contact email address (notification target)
    pub contact_email: String,
    /// Contact phone number
    pub contact_phone: String,
    /// Total price
    pub price: f64,
    /// Whether the booking has been paid
    pub paid: bool,
    /// Whether the booking has been confirmed
    pub confirmed: bool,
    /// Recorded check-in timestamp, if the visitor arrived
    pub entry_at: Option<NaiveDateTime>,
    /// Recorded check-out timestamp, if the visitor left
    pub exit_at: Option<NaiveDateTime>,
    /// Whether a reminder has been sent
    pub reminder_sent: bool,
    /// Priority while on the waiting list (higher is promoted first)
    pub waiting_priority: i64,
    /// Owning park
    pub park_id: ParkId,
}

impl Booking {
    /// Decode a booking from a result row.
    ///
    /// The row must carry the 17 columns of the booking contract in field
    /// order; `entry_at` and `exit_at` may be NULL.
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Booking {
            id: BookingId(expect_int(row, 0, "id")?),
            visit_date: expect_date(row, 1, "visit_date")?,
            visit_time: expect_time(row, 2, "visit_time")?,
            booking_date: expect_date(row, 3, "booking_date")?,
            visit_type: VisitType::parse(&expect_text(row, 4, "visit_type")?)?,
            visitor_count: expect_int(row, 5, "visitor_count")?,
            contact_name: expect_text(row, 6, "contact_name")?,
            contact_email: expect_text(row, 7, "contact_email")?,
            contact_phone: expect_text(row, 8, "contact_phone")?,
            price: expect_float(row, 9, "price")?,
            paid: expect_bool(row, 10, "paid")?,
            confirmed: expect_bool(row, 11, "confirmed")?,
            entry_at: optional_datetime(row, 12, "entry_at")?,
            exit_at: optional_datetime(row, 13, "exit_at")?,
            reminder_sent: expect_bool(row, 14, "reminder_sent")?,
            waiting_priority: expect_int(row, 15, "waiting_priority")?,
            park_id: ParkId(expect_int(row, 16, "park_id")?),
        })
    }

    /// Encode this booking as ordered column/value pairs for INSERT rendering
    pub fn to_column_values(&self) -> Vec<(String, SqlValue)> {
        vec![
            ("id".into(), SqlValue::Int(self.id.0)),
            ("visit_date".into(), SqlValue::Date(self.visit_date)),
            ("visit_time".into(), SqlValue::Time(self.visit_time)),
            ("booking_date".into(), SqlValue::Date(self.booking_date)),
            ("visit_type".into(), SqlValue::Text(self.visit_type.as_str().into())),
            ("visitor_count".into(), SqlValue::Int(self.visitor_count)),
            ("contact_name".into(), SqlValue::Text(self.contact_name.clone())),
            ("contact_email".into(), SqlValue::Text(self.contact_email.clone())),
            ("contact_phone".into(), SqlValue::Text(self.contact_phone.clone())),
            ("price".into(), SqlValue::Float(self.price)),
            ("paid".into(), SqlValue::Bool(self.paid)),
            ("confirmed".into(), SqlValue::Bool(self.confirmed)),
            ("entry_at".into(), optional_datetime_value(self.entry_at)),
            ("exit_at".into(), optional_datetime_value(self.exit_at)),
            ("reminder_sent".into(), SqlValue::Bool(self.reminder_sent)),
            ("waiting_priority".into(), SqlValue::Int(self.waiting_priority)),
            ("park_id".into(), SqlValue::Int(self.park_id.0)),
        ]
    }

    /// Combined visit date and time, for passed-slot comparison
    pub fn visit_datetime(&self) -> NaiveDateTime {
        self.visit_date.and_time(self.visit_time)
    }
}

/// One park record.
///
/// Read by the reconciliation scheduler once per pass; never mutated by the
/// core itself (capacity edits belong to an external collaborator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Park {
    /// Park identifier
    pub id: ParkId,
    /// Display name; per-park table names derive from it
    pub name: String,
    /// City or locality
    pub city: String,
    /// Administrative department
    pub department: String,
    /// Responsible manager's name
    pub manager_name: String,
    /// Responsible manager's email
    pub manager_email: String,
    /// Capacity: maximum simultaneous visitors
    pub max_visitors: i64,
    /// Capacity: maximum concurrent orders
    pub max_concurrent_orders: i64,
    /// Per-visit time limit, in minutes
    pub visit_time_limit_minutes: i64,
    /// Current occupancy counter
    pub current_occupancy: i64,
}

impl Park {
    /// Decode a park from a result row (10 columns, field order)
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Park {
            id: ParkId(expect_int(row, 0, "id")?),
            name: expect_text(row, 1, "name")?,
            city: expect_text(row, 2, "city")?,
            department: expect_text(row, 3, "department")?,
            manager_name: expect_text(row, 4, "manager_name")?,
            manager_email: expect_text(row, 5, "manager_email")?,
            max_visitors: expect_int(row, 6, "max_visitors")?,
            max_concurrent_orders: expect_int(row, 7, "max_concurrent_orders")?,
            visit_time_limit_minutes: expect_int(row, 8, "visit_time_limit_minutes")?,
            current_occupancy: expect_int(row, 9, "current_occupancy")?,
        })
    }

    /// Physical table name for one of this park's role tables
    pub fn table(&self, role: TableRole) -> String {
        park_table_name(&self.name, role)
    }
}

fn cell<'a>(row: &'a Row, idx: usize, col: &str) -> Result<&'a SqlValue> {
    row.get(idx)
        .ok_or_else(|| Error::RowDecode(format!("column {col}: missing at index {idx}")))
}

fn expect_int(row: &Row, idx: usize, col: &str) -> Result<i64> {
    match cell(row, idx, col)? {
        SqlValue::Int(v) => Ok(*v),
        other => Err(decode_mismatch(col, "Int", other)),
    }
}

fn expect_float(row: &Row, idx: usize, col: &str) -> Result<f64> {
    match cell(row, idx, col)? {
        SqlValue::Float(v) => Ok(*v),
        // Integral prices come back as Int from some drivers
        SqlValue::Int(v) => Ok(*v as f64),
        other => Err(decode_mismatch(col, "Float", other)),
    }
}

fn expect_text(row: &Row, idx: usize, col: &str) -> Result<String> {
    match cell(row, idx, col)? {
        SqlValue::Text(v) => Ok(v.clone()),
        other => Err(decode_mismatch(col, "Text", other)),
    }
}

fn expect_bool(row: &Row, idx: usize, col: &str) -> Result<bool> {
    match cell(row, idx, col)? {
        SqlValue::Bool(v) => Ok(*v),
        other => Err(decode_mismatch(col, "Bool", other)),
    }
}

fn expect_date(row: &Row, idx: usize, col: &str) -> Result<NaiveDate> {
    match cell(row, idx, col)? {
        SqlValue::Date(v) => Ok(*v),
        other => Err(decode_mismatch(col, "Date", other)),
    }
}

fn expect_time(row: &Row, idx: usize, col: &str) -> Result<NaiveTime> {
    match cell(row, idx, col)? {
        SqlValue::Time(v) => Ok(*v),
        other => Err(decode_mismatch(col, "Time", other)),
    }
}

fn optional_datetime(row: &Row, idx: usize, col: &str) -> Result<Option<NaiveDateTime>> {
    match cell(row, idx, col)? {
        SqlValue::Null => Ok(None),
        SqlValue::DateTime(v) => Ok(Some(*v)),
        other => Err(decode_mismatch(col, "DateTime or Null", other)),
    }
}

fn optional_datetime_value(v: Option<NaiveDateTime>) -> SqlValue {
    match v {
        Some(dt) => SqlValue::DateTime(dt),
        None => SqlValue::Null,
    }
}

fn decode_mismatch(col: &str, expected: &str, got: &SqlValue) -> Error {
    Error::RowDecode(format!(
        "column {col}: expected {expected}, got {}",
        got.type_name()
    ))
}
