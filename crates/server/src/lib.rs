//! Parkwell server: connection registry, dispatcher and pipeline
//!
//! The server handles each client connection on an independent task; the
//! registry owns the live set of connection handles and exposes the
//! broadcast primitive the reconciliation engine fans notices out with.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod dispatcher;
pub mod registry;

pub use connection::{serve_connection, spawn_connection, Server};
pub use dispatcher::Dispatcher;
pub use registry::{ConnectionHandle, ConnectionRegistry};
