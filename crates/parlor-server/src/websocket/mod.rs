//! WebSocket relay: connection state, fan-out hub, admission registry, and
//! the per-socket session loop.

pub mod connection;
pub mod hub;
pub mod registry;
pub mod session;
