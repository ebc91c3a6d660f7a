//! Core types and traits for Parkwell
//!
//! This crate defines the foundational types used throughout the system:
//! - SqlValue / Row: typed cells for statement literals and result rows
//! - Booking / Park: the domain records reconciliation moves around
//! - TableRole / park_table_name: table-membership-as-state naming
//! - Error: error type hierarchy
//! - Traits: collaborator seams (Storage, Notifier)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;
pub mod types;
pub mod value;

// Re-export commonly used types and traits
pub use error::{Error, Result};
pub use traits::{BookingNotice, NotificationEvent, Notifier, Storage};
pub use types::{
    park_table_name, Booking, BookingId, ConnectionId, Park, ParkId, TableRole,
    TransactionHandle, VisitType, PARKS_TABLE,
};
pub use value::{Row, SqlValue};
