//! Connection registry: the live set of attached clients
//!
//! The registry exclusively owns the connection handles. Identity is the
//! connection id, not any application-level user identity — two sessions
//! from the same human are two registrations. Duplicate registration and
//! missing deregistration are benign: logged, rejected, state unchanged.
//!
//! `broadcast` is a best-effort fan-out: a delivery failure to one
//! connection is logged and never aborts delivery to the rest.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parkwell_core::{ConnectionId, Error, Result};
use parkwell_protocol::Envelope;
use tokio::sync::mpsc;
use tracing::warn;

/// Outbound handle for one registered connection.
///
/// Wraps the sending half of the connection's outbound queue; the writer
/// task on the other end drains it onto the socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl ConnectionHandle {
    /// Wrap an outbound queue sender
    pub fn new(sender: mpsc::UnboundedSender<Envelope>) -> Self {
        ConnectionHandle { sender }
    }

    /// Queue one envelope for delivery. Returns false if the connection's
    /// writer is gone.
    pub fn send(&self, envelope: Envelope) -> bool {
        self.sender.send(envelope).is_ok()
    }
}

/// Tracks which remote clients are currently attached to the server
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    members: DashMap<ConnectionId, ConnectionHandle>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ConnectionRegistry {
            members: DashMap::new(),
        }
    }

    /// Register a connection.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRegistered` if the id is already present; the member
    /// set is left unchanged.
    pub fn register(&self, id: ConnectionId, handle: ConnectionHandle) -> Result<()> {
        match self.members.entry(id) {
            Entry::Occupied(_) => {
                warn!(%id, "duplicate registration ignored");
                Err(Error::AlreadyRegistered(id))
            }
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(())
            }
        }
    }

    /// Deregister a connection.
    ///
    /// # Errors
    ///
    /// Returns `NotRegistered` if the id is not present; a no-op otherwise.
    pub fn deregister(&self, id: ConnectionId) -> Result<()> {
        match self.members.remove(&id) {
            Some(_) => Ok(()),
            None => {
                warn!(%id, "deregistration of unknown connection ignored");
                Err(Error::NotRegistered(id))
            }
        }
    }

    /// Deliver an envelope to every registered connection, best-effort.
    ///
    /// Returns the number of connections the envelope was queued for. A
    /// failed delivery is logged and does not abort the fan-out.
    pub fn broadcast(&self, envelope: &Envelope) -> usize {
        let mut delivered = 0;
        for member in self.members.iter() {
            if member.value().send(envelope.clone()) {
                delivered += 1;
            } else {
                warn!(id = %member.key(), "broadcast delivery failed");
            }
        }
        delivered
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkwell_protocol::Notice;

    fn handle() -> (ConnectionHandle, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ConnectionHandle::new(tx), rx)
    }

    #[test]
    fn test_register_and_count() {
        let registry = ConnectionRegistry::new();
        let (h, _rx) = handle();
        assert!(registry.is_empty());
        registry.register(ConnectionId::new(), h).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        let (h1, _rx1) = handle();
        let (h2, _rx2) = handle();

        registry.register(id, h1).unwrap();
        let err = registry.register(id, h2).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered(_)));
        // Member count unchanged by the rejected call
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_two_sessions_are_distinct_registrations() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = handle();
        let (h2, _rx2) = handle();
        registry.register(ConnectionId::new(), h1).unwrap();
        registry.register(ConnectionId::new(), h2).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_deregister_unknown_is_benign() {
        let registry = ConnectionRegistry::new();
        let err = registry.deregister(ConnectionId::new()).unwrap_err();
        assert!(matches!(err, Error::NotRegistered(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_deregister_removes() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::new();
        let (h, _rx) = handle();
        registry.register(id, h).unwrap();
        registry.deregister(id).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_broadcast_reaches_all_members() {
        let registry = ConnectionRegistry::new();
        let (h1, mut rx1) = handle();
        let (h2, mut rx2) = handle();
        registry.register(ConnectionId::new(), h1).unwrap();
        registry.register(ConnectionId::new(), h2).unwrap();

        let notice = Envelope::server_notice(Notice::MaintenanceInProgress);
        let delivered = registry.broadcast(&notice);
        assert_eq!(delivered, 2);
        assert_eq!(rx1.try_recv().unwrap(), notice);
        assert_eq!(rx2.try_recv().unwrap(), notice);
    }

    #[test]
    fn test_broadcast_tolerates_partial_failure() {
        let registry = ConnectionRegistry::new();
        let (alive, mut alive_rx) = handle();
        let (dead, dead_rx) = handle();
        // Dropping the receiver kills this connection's outbound queue
        drop(dead_rx);

        registry.register(ConnectionId::new(), alive).unwrap();
        registry.register(ConnectionId::new(), dead).unwrap();

        let notice = Envelope::server_notice(Notice::MaintenanceInProgress);
        let delivered = registry.broadcast(&notice);
        assert_eq!(delivered, 1);
        assert_eq!(alive_rx.try_recv().unwrap(), notice);
    }

    #[test]
    fn test_broadcast_empty_registry() {
        let registry = ConnectionRegistry::new();
        let notice = Envelope::server_notice(Notice::MaintenanceInProgress);
        assert_eq!(registry.broadcast(&notice), 0);
    }
}
