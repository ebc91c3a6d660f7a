//! Wire protocol for Parkwell
//!
//! Defines the query envelope (the single message type crossing the wire or
//! used internally for storage calls), its SQL rendering, and the
//! length-prefixed JSON framing used on the transport.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod envelope;
pub mod frame;
mod render;

pub use envelope::{
    ColumnSpec, Comparator, Condition, Connective, Envelope, EnvelopeKind, Notice,
    QueryOperation, WhereClause,
};
pub use frame::{read_frame, write_frame, MAX_FRAME_LEN};
