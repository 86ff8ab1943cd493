//! Message fan-out to connected chat clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::counter;
use parlor_core::ConnectionId;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::ClientConnection;

/// The single shared relay point.
///
/// Every connected client is a subscriber; every published message is
/// enqueued onto every subscriber's bounded queue, including the sender's.
/// Publishing never waits on a subscriber: a full queue counts as a dropped
/// delivery, and a subscriber whose cumulative drops reach `max_drops` is
/// removed rather than allowed to stall the relay or grow memory.
pub struct ChatHub {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Atomic counter tracking total connections (avoids read-locking for count queries).
    active_count: AtomicUsize,
    /// Total lifetime drops before a slow subscriber is disconnected.
    max_drops: u64,
}

impl ChatHub {
    /// Create a hub with the given slow-client threshold.
    pub fn new(max_drops: u64) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            max_drops,
        }
    }

    /// Register a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Deregister a connection by ID. Unknown IDs are a no-op.
    pub async fn remove(&self, connection_id: &ConnectionId) -> bool {
        let mut conns = self.connections.write().await;
        if conns.remove(connection_id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Fan a message out to every registered connection.
    ///
    /// Each delivery attempt is independent: one subscriber's full queue
    /// never blocks the publisher or any other subscriber. Slow subscribers
    /// over the drop threshold are removed after the fan-out pass, so the
    /// subscriber map is never mutated while it is being iterated.
    pub async fn publish(&self, text: Arc<str>) {
        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read().await;
            let recipients = conns.len();
            for conn in conns.values() {
                if !conn.send(Arc::clone(&text)) {
                    counter!("ws_broadcast_drops_total").increment(1);
                    let drops = conn.drop_count();
                    if drops >= self.max_drops {
                        warn!(conn_id = %conn.id, drops, "disconnecting slow client");
                        to_remove.push(conn.id.clone());
                    } else {
                        warn!(conn_id = %conn.id, total_drops = drops, "delivery dropped (queue full)");
                    }
                }
            }
            debug!(recipients, len = text.len(), "message relayed");
        }
        if !to_remove.is_empty() {
            let mut conns = self.connections.write().await;
            for id in &to_remove {
                if conns.remove(id).is_some() {
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Whether a connection is currently registered.
    pub async fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_connection(capacity: usize) -> (Arc<ClientConnection>, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Arc::new(ClientConnection::new(ConnectionId::new(), tx)), rx)
    }

    fn make_hub() -> ChatHub {
        ChatHub::new(100)
    }

    #[tokio::test]
    async fn add_and_count() {
        let hub = make_hub();
        assert_eq!(hub.connection_count(), 0);
        let (conn, _rx) = make_connection(32);
        hub.add(conn).await;
        assert_eq!(hub.connection_count(), 1);
    }

    #[tokio::test]
    async fn remove_connection() {
        let hub = make_hub();
        let (conn, _rx) = make_connection(32);
        let id = conn.id.clone();
        hub.add(conn).await;
        assert!(hub.remove(&id).await);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let hub = make_hub();
        assert!(!hub.remove(&ConnectionId::new()).await);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn remove_twice_is_noop() {
        let hub = make_hub();
        let (conn, _rx) = make_connection(32);
        let id = conn.id.clone();
        hub.add(conn).await;
        assert!(hub.remove(&id).await);
        assert!(!hub.remove(&id).await);
        assert_eq!(hub.connection_count(), 0);
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let hub = make_hub();
        let (c1, mut rx1) = make_connection(32);
        let (c2, mut rx2) = make_connection(32);
        hub.add(c1).await;
        hub.add(c2).await;

        hub.publish(Arc::from("hi all")).await;

        assert_eq!(&*rx1.try_recv().unwrap(), "hi all");
        assert_eq!(&*rx2.try_recv().unwrap(), "hi all");
    }

    #[tokio::test]
    async fn publish_to_empty_hub() {
        let hub = make_hub();
        // No subscribers, no panic
        hub.publish(Arc::from("into the void")).await;
    }

    #[tokio::test]
    async fn publish_shares_one_allocation() {
        let hub = make_hub();
        let (c1, mut rx1) = make_connection(32);
        let (c2, mut rx2) = make_connection(32);
        hub.add(c1).await;
        hub.add(c2).await;

        hub.publish(Arc::from("shared")).await;

        let m1 = rx1.recv().await.unwrap();
        let m2 = rx2.recv().await.unwrap();
        assert!(Arc::ptr_eq(&m1, &m2));
    }

    #[tokio::test]
    async fn per_sender_order_preserved() {
        let hub = make_hub();
        let (c1, mut rx1) = make_connection(32);
        hub.add(c1).await;

        for i in 0..10 {
            hub.publish(Arc::from(format!("m{i}").as_str())).await;
        }
        for i in 0..10 {
            assert_eq!(&*rx1.recv().await.unwrap(), &format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_block_others() {
        let hub = make_hub();
        // Slow client: queue of 1, never drained
        let (slow, _slow_rx) = make_connection(1);
        let (fast, mut fast_rx) = make_connection(64);
        hub.add(slow).await;
        hub.add(fast).await;

        for i in 0..20 {
            hub.publish(Arc::from(format!("m{i}").as_str())).await;
        }
        // Fast client got everything, in order
        for i in 0..20 {
            assert_eq!(&*fast_rx.recv().await.unwrap(), &format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn slow_subscriber_disconnected_after_threshold() {
        let hub = ChatHub::new(10);
        let (slow, _slow_rx) = make_connection(1);
        let (fast, mut fast_rx) = make_connection(64);
        hub.add(slow).await;
        hub.add(fast).await;
        assert_eq!(hub.connection_count(), 2);

        // First publish fills the slow queue; ten more cross the threshold.
        for _ in 0..=10 {
            hub.publish(Arc::from("tick")).await;
        }

        assert_eq!(hub.connection_count(), 1);
        assert!(fast_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn removed_subscriber_receives_nothing_further() {
        let hub = make_hub();
        let (conn, mut rx) = make_connection(32);
        let id = conn.id.clone();
        hub.add(conn).await;

        hub.publish(Arc::from("before")).await;
        assert!(hub.remove(&id).await);
        hub.publish(Arc::from("after")).await;

        assert_eq!(&*rx.try_recv().unwrap(), "before");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn contains_tracks_membership() {
        let hub = make_hub();
        let (conn, _rx) = make_connection(32);
        let id = conn.id.clone();
        assert!(!hub.contains(&id).await);
        hub.add(conn).await;
        assert!(hub.contains(&id).await);
        let _ = hub.remove(&id).await;
        assert!(!hub.contains(&id).await);
    }

    #[tokio::test]
    async fn empty_message_relayed_as_is() {
        let hub = make_hub();
        let (conn, mut rx) = make_connection(32);
        hub.add(conn).await;
        hub.publish(Arc::from("")).await;
        assert!(rx.recv().await.unwrap().is_empty());
    }
}
