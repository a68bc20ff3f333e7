//! CLI error type.

use pairbox_core::{DirectoryError, MailboxError, StoreError};
use thiserror::Error;

/// Anything a CLI command can fail with.
#[derive(Debug, Error)]
pub enum CliError {
    /// Document store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Mailbox operation failed.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    /// Friends, contacts, mood, or journal operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// The command needs `--as <email>`.
    #[error("this command needs --as <email>")]
    MissingUser,

    /// No account uses this email.
    #[error("no account registered for {email}")]
    UnknownUser {
        /// Email that was looked up.
        email: String,
    },

    /// An account already uses this email.
    #[error("{email} is already registered")]
    AlreadyRegistered {
        /// Duplicate email.
        email: String,
    },

    /// Email is blank.
    #[error("invalid email {0:?}")]
    InvalidEmail(String),
}
