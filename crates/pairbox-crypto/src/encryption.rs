//! Message sealing with XChaCha20-Poly1305.
//!
//! A sealed message is a self-contained blob:
//!
//! ```text
//! ┌─────────┬──────────────┬─────────────────────────┐
//! │ version │ nonce (24 B) │ ciphertext ‖ tag (16 B) │
//! └─────────┴──────────────┴─────────────────────────┘
//! ```
//!
//! stored as URL-safe base64 text without padding. The version byte is
//! authenticated as associated data, so flipping it is detected even though
//! it is sent in the clear.
//!
//! The 24-byte XChaCha nonce is large enough that random nonces never need
//! coordination between the two writers of a conversation.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::{
    derivation::ConversationKey,
    error::{DecryptionError, EncryptionError},
};

/// Current blob format version.
pub const BLOB_VERSION: u8 = 0x01;

/// Random bytes the caller supplies per message (the full XChaCha nonce).
pub const NONCE_RANDOM_SIZE: usize = 24;

/// Poly1305 tag size.
const TAG_SIZE: usize = 16;

/// Smallest valid blob: version, nonce, and a tag over an empty message.
const MIN_BLOB_SIZE: usize = 1 + NONCE_RANDOM_SIZE + TAG_SIZE;

/// An encrypted message payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// Format version (associated data).
    pub version: u8,
    /// XChaCha20 nonce.
    pub nonce: [u8; NONCE_RANDOM_SIZE],
    /// Ciphertext with the Poly1305 tag appended.
    pub ciphertext: Vec<u8>,
}

impl SealedMessage {
    /// Binary form: `version || nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + NONCE_RANDOM_SIZE + self.ciphertext.len());
        out.push(self.version);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse the binary form.
    ///
    /// Only checks framing. Version and authenticity are checked by
    /// [`decrypt_message`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecryptionError> {
        if bytes.len() < MIN_BLOB_SIZE {
            return Err(DecryptionError::Malformed {
                reason: format!("{} bytes, need at least {MIN_BLOB_SIZE}", bytes.len()),
            });
        }

        let (version, rest) = bytes.split_at(1);
        let (nonce, ciphertext) = rest.split_at(NONCE_RANDOM_SIZE);

        let mut nonce_bytes = [0u8; NONCE_RANDOM_SIZE];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self { version: version[0], nonce: nonce_bytes, ciphertext: ciphertext.to_vec() })
    }

    /// Text form stored in the mailbox record.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// Parse the text form.
    pub fn parse(text: &str) -> Result<Self, DecryptionError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(text.trim())
            .map_err(|e| DecryptionError::Malformed { reason: e.to_string() })?;
        Self::from_bytes(&bytes)
    }
}

/// Encrypt `plaintext` under `key`.
///
/// `nonce_random` must be fresh random bytes for every call. Reusing a nonce
/// under the same key leaks the XOR of the two plaintexts.
///
/// # Errors
///
/// `TooLong` if the cipher refuses the plaintext (beyond 256 GiB).
pub fn encrypt_message(
    key: &ConversationKey,
    plaintext: &str,
    nonce_random: [u8; NONCE_RANDOM_SIZE],
) -> Result<SealedMessage, EncryptionError> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let aad = [BLOB_VERSION];

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce_random), Payload { msg: plaintext.as_bytes(), aad: &aad })
        .map_err(|_| EncryptionError::TooLong { len: plaintext.len() })?;

    Ok(SealedMessage { version: BLOB_VERSION, nonce: nonce_random, ciphertext })
}

/// Decrypt a sealed message under `key`.
///
/// # Errors
///
/// - `UnsupportedVersion` if the blob uses an unknown format
/// - `Authentication` if the key is wrong or any byte was modified
/// - `NotUtf8` if the authenticated plaintext is not text
pub fn decrypt_message(
    key: &ConversationKey,
    sealed: &SealedMessage,
) -> Result<String, DecryptionError> {
    if sealed.version != BLOB_VERSION {
        return Err(DecryptionError::UnsupportedVersion(sealed.version));
    }

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let aad = [sealed.version];

    let plaintext = cipher
        .decrypt(XNonce::from_slice(&sealed.nonce), Payload { msg: &sealed.ciphertext, aad: &aad })
        .map_err(|_| DecryptionError::Authentication)?;

    String::from_utf8(plaintext).map_err(|_| DecryptionError::NotUtf8)
}
