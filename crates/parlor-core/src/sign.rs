//! MOTD response signing.
//!
//! The `/motd` endpoint signs the exact serialized body bytes with MD5 and
//! publishes the digest in an `X-FUN-SIG` header. The caller must hash the
//! same buffer it sends — signing and body must never come from separate
//! serialization passes.

use md5::{Digest, Md5};
use thiserror::Error;

/// Signing failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignError {
    /// Refuse to sign an absent body.
    #[error("cannot sign an empty body")]
    EmptyBody,
}

/// Compute the uppercase-hex MD5 digest of `body`.
///
/// An empty body is a precondition violation: a signature over absent data
/// would always verify against nothing, so this fails fast instead.
pub fn fun_sig(body: &[u8]) -> Result<String, SignError> {
    if body.is_empty() {
        return Err(SignError::EmptyBody);
    }
    let digest = Md5::digest(body);
    Ok(digest.iter().map(|byte| format!("{byte:02X}")).collect())
}
