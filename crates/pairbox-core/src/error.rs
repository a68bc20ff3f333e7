//! Error types for stores, mailboxes, and user records.

use pairbox_crypto::EncryptionError;
use thiserror::Error;

/// Document store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached or the call failed.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Underlying failure.
        reason: String,
    },

    /// A path segment is empty or contains a reserved character.
    #[error("invalid store path {path:?}: {reason}")]
    InvalidPath {
        /// Offending path or segment.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A document could not be encoded or decoded.
    #[error("document encoding failed: {reason}")]
    Encoding {
        /// Serializer message.
        reason: String,
    },
}

impl StoreError {
    /// Shorthand for [`StoreError::Unavailable`].
    pub fn unavailable(reason: impl ToString) -> Self {
        Self::Unavailable { reason: reason.to_string() }
    }
}

/// Failures of mailbox operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// Participant identifier rejected.
    #[error("invalid participant id {id:?}: {reason}")]
    InvalidParticipant {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Sender and receiver are the same participant.
    #[error("cannot open a conversation with yourself")]
    SelfConversation,

    /// Message text is empty after trimming.
    #[error("message is empty")]
    EmptyMessage,

    /// The message could not be sealed. Nothing was written.
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    /// Store call failed before anything was written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The sender's copy was written but the receiver's copy was not.
    ///
    /// No reconciliation happens: the two mailboxes now disagree.
    #[error("message written to {written} but not to {missing}: {source}")]
    PartialWrite {
        /// Mailbox that received the message.
        written: String,
        /// Mailbox that did not.
        missing: String,
        /// Failure of the second write.
        #[source]
        source: StoreError,
    },
}

/// Failures of friends, contacts, mood, and journal operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DirectoryError {
    /// No account is registered under this email.
    #[error("user not found: {email}")]
    UserNotFound {
        /// Email that was looked up.
        email: String,
    },

    /// The email is already on the friends list.
    #[error("{email} is already a friend")]
    AlreadyFriend {
        /// Duplicate email.
        email: String,
    },

    /// Users cannot befriend themselves.
    #[error("cannot add yourself as a friend")]
    SelfFriend,

    /// The email is not on the session user's friends list.
    #[error("{email} is not on your friends list")]
    NotAFriend {
        /// Email that was looked up.
        email: String,
    },

    /// The email is already an emergency contact.
    #[error("{email} is already an emergency contact")]
    DuplicateContact {
        /// Duplicate email.
        email: String,
    },

    /// A required field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Mood label is not one of the known categories.
    #[error("unknown mood {0:?}")]
    UnknownMood(String),

    /// Mood score outside `0.0..=1.0`.
    #[error("mood score {0} is outside 0..=1")]
    InvalidScore(f64),

    /// An identifier returned by the identity provider is unusable.
    #[error("invalid participant id {id:?}: {reason}")]
    InvalidParticipant {
        /// The rejected identifier.
        id: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
