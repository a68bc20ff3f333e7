//! Conversation key derivation.
//!
//! Both participants of a conversation must arrive at the same key without
//! exchanging anything, so the key is a hash of the two identifiers in
//! canonical (sorted) order.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a conversation key in bytes.
pub const KEY_SIZE: usize = 32;

/// Symmetric key shared by the two participants of a conversation.
///
/// # Invariants
///
/// - Never persisted and never logged (`Debug` is redacted)
/// - Not `Clone`: each operation derives its own copy
/// - Zeroized on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ConversationKey([u8; KEY_SIZE]);

impl ConversationKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// URL-safe, padded base64 form of the key.
    ///
    /// This is the key-string format used by earlier deployments, kept so
    /// keys can be compared against them.
    pub fn to_base64(&self) -> String {
        URL_SAFE.encode(self.0)
    }
}

impl PartialEq for ConversationKey {
    fn eq(&self, other: &Self) -> bool {
        // Not constant time. Only used by tests and diagnostics.
        self.0 == other.0
    }
}

impl Eq for ConversationKey {}

impl fmt::Debug for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConversationKey(..)")
    }
}

/// Derive the conversation key for an unordered pair of participants.
///
/// The identifiers are sorted by their natural string ordering, concatenated
/// without a separator, and hashed with SHA-256. The result is identical for
/// `(a, b)` and `(b, a)`.
///
/// With no separator, two pairs whose sorted concatenations coincide share a
/// key (`{"ab", "aba"}` and `{"aba", "ba"}` both hash `"ababa"`). The format
/// is kept for compatibility with existing keys.
///
/// Callers are responsible for rejecting empty identifiers.
pub fn derive_conversation_key(a: &str, b: &str) -> ConversationKey {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    let mut hasher = Sha256::new();
    hasher.update(first.as_bytes());
    hasher.update(second.as_bytes());

    ConversationKey(hasher.finalize().into())
}
