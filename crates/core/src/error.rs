//! Error types for the reservation core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::ConnectionId;
use std::io;
use thiserror::Error;

/// Result type alias for reservation-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the reservation core
#[derive(Debug, Error)]
pub enum Error {
    /// Envelope cannot be rendered: no operation kind, empty target tables,
    /// joiner arity mismatch, or an unguarded unconditional mutation.
    ///
    /// Rejected locally, never sent to the storage collaborator.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The storage collaborator failed to execute a statement or to
    /// commit. Inside a reconciliation pass this rolls back the whole pass.
    #[error("storage fault: {0}")]
    StorageFault(String),

    /// Connection handle was already present in the registry (benign)
    #[error("connection already registered: {0}")]
    AlreadyRegistered(ConnectionId),

    /// Connection handle was not present in the registry (benign)
    #[error("connection not registered: {0}")]
    NotRegistered(ConnectionId),

    /// A second reconciliation pass attempted to start while one was in
    /// flight. The transaction resource is not re-entrant.
    #[error("reconciliation pass already in flight")]
    TransactionConflict,

    /// I/O error (socket reads/writes)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Frame encoding/decoding error
    #[error("codec error: {0}")]
    CodecError(String),

    /// A result row did not match the expected column contract
    #[error("row decode error: {0}")]
    RowDecode(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConnectionId;

    #[test]
    fn test_error_display_malformed() {
        let err = Error::MalformedRequest("no operation selected".to_string());
        let msg = err.to_string();
        assert!(msg.contains("malformed request"));
        assert!(msg.contains("no operation selected"));
    }

    #[test]
    fn test_error_display_storage_fault() {
        let err = Error::StorageFault("connection lost".to_string());
        let msg = err.to_string();
        assert!(msg.contains("storage fault"));
        assert!(msg.contains("connection lost"));
    }

    #[test]
    fn test_error_display_already_registered() {
        let id = ConnectionId::new();
        let err = Error::AlreadyRegistered(id);
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_error_display_not_registered() {
        let id = ConnectionId::new();
        let err = Error::NotRegistered(id);
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_error_display_transaction_conflict() {
        let err = Error::TransactionConflict;
        assert!(err.to_string().contains("already in flight"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::IoError(_)));
    }

    #[test]
    fn test_error_display_row_decode() {
        let err = Error::RowDecode("column id: expected Int, got Text".to_string());
        let msg = err.to_string();
        assert!(msg.contains("row decode"));
        assert!(msg.contains("expected Int"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(7)
        }

        fn returns_error() -> Result<i32> {
            Err(Error::TransactionConflict)
        }

        assert_eq!(returns_result().unwrap(), 7);
        assert!(returns_error().is_err());
    }
}
