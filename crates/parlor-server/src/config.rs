//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the parlor server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Production mode: chat URLs are generated with the `wss` scheme.
    pub production: bool,
    /// Origins allowed to open a chat socket. `None` accepts any origin,
    /// as long as the header is present at all.
    pub allowed_origins: Option<Vec<String>>,
    /// Per-connection outbound queue capacity (messages).
    pub send_buffer: usize,
    /// Total dropped deliveries before a slow client is disconnected.
    pub max_drops: u64,
    /// Interval between server-initiated Ping frames, in seconds.
    pub ping_interval_secs: u64,
    /// Disconnect after this long without a Pong, in seconds.
    pub pong_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            production: false,
            allowed_origins: None,
            send_buffer: 256,
            max_drops: 100,
            ping_interval_secs: 30,
            pong_timeout_secs: 60,
        }
    }
}
