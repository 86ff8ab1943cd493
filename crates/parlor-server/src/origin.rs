//! Same-origin admission gate.
//!
//! WebSocket does not implement the Same Origin Policy, so the upgrade
//! request's `Origin` header is the only thing standing between the relay
//! and cross-site WebSocket hijacking (RFC 6455 §1.3). The check fails
//! closed: a request with no `Origin` header at all is never admitted.

use thiserror::Error;

/// Why an upgrade request was turned away.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OriginRejection {
    /// The upgrade request carried no `Origin` header.
    #[error("missing Origin header")]
    Missing,
    /// The declared origin is not in the allow list.
    #[error("origin not allowed: {0}")]
    NotAllowed(String),
}

/// Predicate over the `Origin` header of an upgrade request.
#[derive(Debug, Clone)]
pub enum OriginPolicy {
    /// Accept any request that declares an origin.
    AllowAny,
    /// Accept only origins that exactly match an entry in the list.
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Build the policy from configuration: `None` means [`OriginPolicy::AllowAny`].
    #[must_use]
    pub fn from_allowed(allowed: Option<Vec<String>>) -> Self {
        match allowed {
            Some(list) => Self::AllowList(list),
            None => Self::AllowAny,
        }
    }

    /// Evaluate the header value. `None` (header absent) always rejects.
    pub fn check(&self, origin: Option<&str>) -> Result<(), OriginRejection> {
        let origin = origin.ok_or(OriginRejection::Missing)?;
        match self {
            Self::AllowAny => Ok(()),
            Self::AllowList(list) => {
                if list.iter().any(|allowed| allowed == origin) {
                    Ok(())
                } else {
                    Err(OriginRejection::NotAllowed(origin.to_owned()))
                }
            }
        }
    }
}
