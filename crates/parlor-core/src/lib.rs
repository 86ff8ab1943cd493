//! # parlor-core
//!
//! Leaf types and policy shared by the parlor chat service:
//!
//! - [`ids`]: branded connection identifiers (UUID v7)
//! - [`message`]: chat message length policy and truncation
//! - [`sign`]: MOTD body signing (uppercase-hex MD5)

#![deny(unsafe_code)]

pub mod ids;
pub mod message;
pub mod sign;

pub use ids::ConnectionId;
pub use message::{truncate, MAX_TEXT_LEN};
pub use sign::{fun_sig, SignError};
