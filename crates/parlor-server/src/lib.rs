//! # parlor-server
//!
//! Axum HTTP + `WebSocket` chat relay server.
//!
//! - HTTP endpoints: chat page, signed MOTD, health check, metrics
//! - `WebSocket` relay: origin-gated admission, per-connection send queues,
//!   fire-and-forget fan-out to every connected client
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod motd;
pub mod origin;
pub mod pages;
pub mod server;
pub mod shutdown;
pub mod websocket;
