//! Parkwell — park-visit reservation core
//!
//! A client process and a server process exchange typed query envelopes
//! over a persistent connection, backed by a relational store; recurring
//! reconciliation sweeps keep every park's live tables consistent with the
//! calendar.
//!
//! # Quick start
//!
//! ```ignore
//! use parkwell::{Envelope, ColumnSpec, WhereClause, Server, Reconciler, RecurringScheduler};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let server = Server::new(storage.clone());
//! let scheduler = RecurringScheduler::new(Duration::from_secs(3600));
//! let reconciler = Arc::new(Reconciler::new(storage, server.registry(), notifier));
//! reconciler.register_jobs(&scheduler);
//! server.serve(listener).await?;
//! ```
//!
//! # Architecture
//!
//! The workspace splits along the seams of the system: `parkwell-core`
//! (types, errors, collaborator traits), `parkwell-protocol` (the query
//! envelope, rendering, framing), `parkwell-server` (registry, dispatcher,
//! connection pipeline) and `parkwell-engine` (recurring scheduler and the
//! reconciliation sweeps). This crate re-exports the public surface.

pub use parkwell_core::{
    park_table_name, Booking, BookingId, BookingNotice, ConnectionId, Error, NotificationEvent,
    Notifier, Park, ParkId, Result, Row, SqlValue, Storage, TableRole, TransactionHandle,
    VisitType, PARKS_TABLE,
};
pub use parkwell_engine::{
    Reconciler, RecurringScheduler, SchedulerStats, SweepReport, NO_SHOW_REASON,
};
pub use parkwell_protocol::{
    read_frame, write_frame, ColumnSpec, Comparator, Condition, Connective, Envelope,
    EnvelopeKind, Notice, QueryOperation, WhereClause, MAX_FRAME_LEN,
};
pub use parkwell_server::{
    serve_connection, spawn_connection, ConnectionHandle, ConnectionRegistry, Dispatcher, Server,
};
