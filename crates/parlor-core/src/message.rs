//! Chat message length policy.
//!
//! The relay carries raw text with a single rule: no message is longer than
//! [`MAX_TEXT_LEN`] characters. Oversize input is truncated at ingress, never
//! rejected and never re-truncated at egress.

/// Maximum chat message length in characters.
pub const MAX_TEXT_LEN: usize = 100;

/// Truncate `text` to the first [`MAX_TEXT_LEN`] characters.
///
/// Counts Unicode scalar values, not bytes, so the cut never lands inside a
/// multi-byte sequence. Returns the input unchanged (same slice) when it is
/// already within the limit.
#[must_use]
pub fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
