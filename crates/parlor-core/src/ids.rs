//! Branded connection identifier.
//!
//! A newtype wrapper around `String` so a connection ID cannot be confused
//! with arbitrary text flowing through the relay. IDs are UUID v7
//! (time-ordered) generated via [`uuid::Uuid::now_v7`].

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one connected client, created at admission and used for
/// deregistration and for routing delivery failures.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a new random ID (UUID v7, time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Create from an existing string value.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
