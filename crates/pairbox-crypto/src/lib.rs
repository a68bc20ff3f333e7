//! Pairbox Cryptographic Primitives
//!
//! Cryptographic building blocks for pairwise mailboxes. Pure functions with
//! deterministic outputs. Callers provide random bytes for deterministic
//! testing.
//!
//! # Key Lifecycle
//!
//! A conversation key is never stored. It is recomputed from the two
//! participant identifiers for every operation and dropped (and zeroized)
//! when that operation returns.
//!
//! ```text
//! {participant A, participant B}
//!        │
//!        ▼ sort + concatenate
//! SHA-256 → Conversation Key (same for A→B and B→A)
//!        │
//!        ▼
//! XChaCha20-Poly1305 → Sealed Message (base64 text)
//! ```
//!
//! # Security
//!
//! Confidentiality and integrity:
//! - XChaCha20-Poly1305 AEAD over the UTF-8 plaintext
//! - Blob version byte is bound as associated data
//! - Failed authentication tag -> reject message, never return garbage
//!
//! Limits:
//! - The key depends only on the participant identifiers. Anyone who knows
//!   both identifiers can derive it. This obscures stored payloads from the
//!   casual reader of the store, it does not authenticate participants.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod derivation;
pub mod encryption;
pub mod error;

pub use derivation::{ConversationKey, KEY_SIZE, derive_conversation_key};
pub use encryption::{
    BLOB_VERSION, NONCE_RANDOM_SIZE, SealedMessage, decrypt_message, encrypt_message,
};
pub use error::{DecryptionError, EncryptionError};
