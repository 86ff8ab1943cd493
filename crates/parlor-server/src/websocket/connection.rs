//! Per-client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use parlor_core::ConnectionId;
use tokio::sync::mpsc;

/// One connected chat client.
///
/// Owns the outbound half of the client's bounded send queue; the session
/// loop drains the other half into the socket. Shared text is passed as
/// `Arc<str>` so fan-out to N clients never copies the message body.
#[derive(Debug)]
pub struct ClientConnection {
    /// Opaque identity, assigned at admission.
    pub id: ConnectionId,
    /// Send channel to the client's socket write task.
    tx: mpsc::Sender<Arc<str>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last ping.
    pub is_alive: AtomicBool,
    /// When the last Pong (or any activity) was received.
    last_pong: Mutex<Instant>,
    /// Deliveries dropped because the queue was full or closed.
    dropped_messages: AtomicU64,
}

impl ClientConnection {
    /// Create a new connection around a send channel.
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<str>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Enqueue a message for delivery without blocking.
    ///
    /// Returns `false` if the queue is full or the socket task is gone, and
    /// increments the drop counter. The relay never waits on a slow client.
    pub fn send(&self, message: Arc<str>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total deliveries dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag.
    ///
    /// Returns `true` if the client showed life since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}
