//! Session registry — the single owner of the live connection set.
//!
//! Admission runs the origin gate before any wiring happens; a rejected
//! request allocates nothing. Release is idempotent so the session loop can
//! call it on every exit path without coordinating who got there first.

use std::sync::Arc;

use parlor_core::ConnectionId;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::connection::ClientConnection;
use super::hub::ChatHub;
use crate::origin::{OriginPolicy, OriginRejection};

/// A freshly admitted connection: the handle registered with the hub plus
/// the receiving half of its send queue, to be drained by the socket task.
#[derive(Debug)]
pub struct Admitted {
    /// The registered connection handle.
    pub connection: Arc<ClientConnection>,
    /// Outbound queue receiver for the socket write task.
    pub outbound: mpsc::Receiver<Arc<str>>,
}

/// Tracks the set of active connections; all membership changes go through
/// [`SessionRegistry::admit`] and [`SessionRegistry::release`].
pub struct SessionRegistry {
    hub: Arc<ChatHub>,
    policy: OriginPolicy,
    send_buffer: usize,
}

impl SessionRegistry {
    /// Create a registry over the given hub.
    pub fn new(hub: Arc<ChatHub>, policy: OriginPolicy, send_buffer: usize) -> Self {
        Self {
            hub,
            policy,
            send_buffer,
        }
    }

    /// Run the origin gate and, on success, create and register a connection.
    ///
    /// On rejection nothing is created and nothing is registered.
    pub async fn admit(&self, origin: Option<&str>) -> Result<Admitted, OriginRejection> {
        self.policy.check(origin)?;

        let (tx, rx) = mpsc::channel(self.send_buffer);
        let connection = Arc::new(ClientConnection::new(ConnectionId::new(), tx));
        self.hub.add(connection.clone()).await;
        debug!(conn_id = %connection.id, "connection admitted");

        Ok(Admitted {
            connection,
            outbound: rx,
        })
    }

    /// Deregister a connection. Releasing an unknown or already-released
    /// ID is a no-op.
    pub async fn release(&self, connection_id: &ConnectionId) {
        if self.hub.remove(connection_id).await {
            info!(conn_id = %connection_id, "connection released");
        }
    }

    /// The hub this registry feeds.
    pub fn hub(&self) -> &Arc<ChatHub> {
        &self.hub
    }
}
