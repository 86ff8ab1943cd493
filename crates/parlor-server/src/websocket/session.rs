//! Per-socket session loop — carries one admitted client from upgrade
//! through disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use parlor_core::message;
use tracing::{debug, info, instrument, warn};

use super::registry::{Admitted, SessionRegistry};

/// Run the relay session for one connected client.
///
/// 1. Spawns an outbound forwarder draining the connection's queue into the
///    socket, with periodic Ping frames and a pong-timeout disconnect
/// 2. Reads inbound frames, truncates each text payload to the message
///    limit, and publishes it to the hub (sender included in fan-out)
/// 3. Releases the connection on any exit path; release is idempotent, so a
///    racing slow-client removal is harmless
#[instrument(skip_all, fields(conn_id = %admitted.connection.id))]
pub async fn run_chat_session(
    ws: WebSocket,
    admitted: Admitted,
    registry: Arc<SessionRegistry>,
    ping_interval: Duration,
    pong_timeout: Duration,
) {
    let Admitted {
        connection,
        outbound: mut send_rx,
    } = admitted;
    let (mut ws_tx, mut ws_rx) = ws.split();

    info!("client connected");
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);

    // Outbound forwarder: queue → socket, plus liveness pings.
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                        // Queue closed: the connection was released elsewhere
                        None => break,
                    }
                }
                _ = ping.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!("client unresponsive for {pong_timeout:?}, disconnecting");
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Ingress: every text frame is truncated and relayed.
    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => Some(s.to_owned()),
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    None
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };

        let Some(text) = text else { continue };

        // A connection the hub dropped (slow consumer) is closed, not kept
        // around as a publish-only participant.
        if !registry.hub().contains(&connection.id).await {
            warn!("connection no longer registered, closing session");
            break;
        }

        counter!("chat_messages_total").increment(1);
        let trimmed = message::truncate(&text);
        registry.hub().publish(Arc::from(trimmed)).await;
    }

    info!("client disconnected");
    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    histogram!("ws_connection_duration_seconds").record(connection.age().as_secs_f64());
    outbound.abort();
    registry.release(&connection.id).await;
}
