//! Connection pipeline: accept loop and per-connection tasks
//!
//! Each accepted connection gets its own inbound pipeline: a reader loop
//! that decodes frames and feeds the dispatcher, and a writer task that
//! drains the connection's outbound queue onto the socket. Responses and
//! broadcasts share the same queue, so outbound frames never interleave.
//!
//! A connection is registered before its first frame is read and
//! deregistered when the reader sees EOF or an I/O error — or earlier, by
//! an explicit disconnect notice through the dispatcher.

use crate::dispatcher::Dispatcher;
use crate::registry::{ConnectionHandle, ConnectionRegistry};
use parkwell_core::{ConnectionId, Result, Storage};
use parkwell_protocol::{read_frame, write_frame};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The reservation server: registry plus dispatcher over shared storage
pub struct Server {
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    /// Build a server over the given storage collaborator
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(storage, registry.clone()));
        Server {
            registry,
            dispatcher,
        }
    }

    /// Shared registry handle (for the reconciliation engine's broadcasts)
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }

    /// Accept connections forever, one pipeline per client.
    ///
    /// # Errors
    ///
    /// Returns an error only if `accept` itself fails fatally.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        loop {
            let (socket, peer) = listener.accept().await?;
            debug!(%peer, "accepted connection");
            let registry = self.registry.clone();
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                serve_connection(socket, registry, dispatcher).await;
            });
        }
    }
}

/// Run one connection's pipeline to completion.
///
/// Generic over the stream so tests can drive it with an in-process duplex
/// pipe instead of a TCP socket.
pub async fn serve_connection<S>(
    stream: S,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let id = ConnectionId::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    if registry.register(id, ConnectionHandle::new(tx.clone())).is_err() {
        // Freshly minted ids cannot collide in practice; bail if one does
        return;
    }
    debug!(%id, "connection registered");

    let (mut reader, mut writer) = tokio::io::split(stream);

    let writer_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            if let Err(e) = write_frame(&mut writer, &envelope).await {
                warn!(error = %e, "outbound write failed, closing writer");
                break;
            }
        }
    });

    loop {
        match read_frame(&mut reader).await {
            Ok(Some(envelope)) => {
                if let Some(response) = dispatcher.handle(envelope, id) {
                    if tx.send(response).is_err() {
                        break;
                    }
                }
            }
            Ok(None) => {
                debug!(%id, "connection closed by peer");
                break;
            }
            Err(e) => {
                warn!(%id, error = %e, "inbound read failed");
                break;
            }
        }
    }

    // Benign if a disconnect notice already removed it
    let _ = registry.deregister(id);
    drop(tx);
    let _ = writer_task.await;
    debug!(%id, "connection closed");
}

/// Convenience for tests and embedding: serve a single in-process stream
/// on a fresh task and return immediately.
pub fn spawn_connection<S>(
    stream: S,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
) -> tokio::task::JoinHandle<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    tokio::spawn(serve_connection(stream, registry, dispatcher))
}
