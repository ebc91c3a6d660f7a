//! Request dispatch: envelope in, correlated response out
//!
//! The dispatcher executes inbound query requests against the storage
//! collaborator and answers with a response envelope carrying the request's
//! correlation id. It holds no persistent state of its own — every
//! successful dispatch is observable only through the storage call it made.
//!
//! The protocol is permissive: any kind/operation combination the
//! dispatcher does not understand is ignored without a response or an
//! error, so newer clients can speak newer message kinds to older servers.
//!
//! Failed requests answer with `success = false` and nothing more — the
//! wire format carries no structured error codes for mutations.

use crate::registry::ConnectionRegistry;
use parkwell_core::{ConnectionId, Storage};
use parkwell_protocol::{Envelope, EnvelopeKind, Notice, QueryOperation};
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes inbound envelopes and produces correlated responses
pub struct Dispatcher {
    storage: Arc<dyn Storage>,
    registry: Arc<ConnectionRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over the shared storage and registry
    pub fn new(storage: Arc<dyn Storage>, registry: Arc<ConnectionRegistry>) -> Self {
        Dispatcher { storage, registry }
    }

    /// Handle one inbound envelope from `source`.
    ///
    /// Returns the response to send back, or `None` when the envelope calls
    /// for no reply (notices, unknown kinds).
    pub fn handle(&self, envelope: Envelope, source: ConnectionId) -> Option<Envelope> {
        match (envelope.kind, envelope.operation) {
            (EnvelopeKind::QueryRequest, Some(QueryOperation::Select)) => {
                Some(self.run_select(&envelope))
            }
            (EnvelopeKind::QueryRequest, Some(_)) => Some(self.run_mutation(&envelope)),
            (EnvelopeKind::QueryRequest, None) => {
                // Malformed: rejected locally, storage never sees it
                Some(Envelope::response_outcome(&envelope, false))
            }
            (EnvelopeKind::ClientNotice, _) if envelope.notice == Some(Notice::Disconnect) => {
                debug!(%source, "client disconnect notice");
                // Benign if the connection pipeline already removed it
                let _ = self.registry.deregister(source);
                None
            }
            _ => {
                debug!(kind = ?envelope.kind, "ignoring envelope of unhandled kind");
                None
            }
        }
    }

    fn run_select(&self, request: &Envelope) -> Envelope {
        let sql = match request.render() {
            Ok(sql) => sql,
            Err(e) => {
                warn!(error = %e, "select request failed to render");
                return Envelope::response_outcome(request, false);
            }
        };
        match self.storage.execute_select(&sql) {
            Ok(rows) => Envelope::response_rows(request, rows),
            Err(e) => {
                warn!(error = %e, "select execution failed");
                Envelope::response_outcome(request, false)
            }
        }
    }

    fn run_mutation(&self, request: &Envelope) -> Envelope {
        let sql = match request.render() {
            Ok(sql) => sql,
            Err(e) => {
                warn!(error = %e, "mutation request failed to render");
                return Envelope::response_outcome(request, false);
            }
        };
        match self.storage.execute_mutation(&sql) {
            Ok(success) => Envelope::response_outcome(request, success),
            Err(e) => {
                warn!(error = %e, "mutation execution failed");
                Envelope::response_outcome(request, false)
            }
        }
    }
}
