//! Error types for message sealing.

use thiserror::Error;

/// A message could not be sealed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncryptionError {
    /// The cipher rejected the plaintext, which only happens past its length
    /// limit.
    #[error("message of {len} bytes is too long to encrypt")]
    TooLong {
        /// Plaintext length in bytes.
        len: usize,
    },
}

/// Reasons a sealed message could not be opened.
///
/// Every variant means "this payload is unreadable under this key". Callers
/// render a placeholder for the record and keep going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptionError {
    /// Blob is not valid base64 or is too short to hold a nonce and tag.
    #[error("malformed sealed message: {reason}")]
    Malformed {
        /// What was wrong with the blob.
        reason: String,
    },

    /// Blob was produced by an unknown format version.
    #[error("unsupported sealed message version {0:#04x}")]
    UnsupportedVersion(u8),

    /// Authentication tag mismatch: wrong key or tampered payload.
    #[error("authentication failed (wrong key or tampered message)")]
    Authentication,

    /// Decrypted bytes are not UTF-8 text.
    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,
}
