//! Pairbox core logic
//!
//! Pairwise secure mailboxes and per-user records on top of a hierarchical
//! document store. Everything here is synchronous and free of global state:
//! the caller passes a [`Session`] into every operation, and time and
//! randomness come from an [`Environment`].
//!
//! # Architecture
//!
//! ```text
//!   FriendsChat (events → actions)
//!         │
//!         ▼
//!   SecureMailbox ──► derive key ──► seal / open   (pairbox-crypto)
//!         │
//!         ▼
//!   MailboxStore (append both copies, prune, ordered fetch)
//!         │
//!         ▼
//!   DocumentStore (memory, redb, fault-injecting)
//! ```
//!
//! # Components
//!
//! - [`store`]: Document store abstraction and in-memory implementation
//! - [`mailbox`]: Mailbox store adapter (duplicated writes, retention)
//! - [`service`]: Secure mailbox combining key derivation, sealing, storage
//! - [`chat`]: Friends chat state machine and its runtime
//! - [`wellness`]: Friends, emergency contacts, mood log, journal
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`error`]: Error types

pub mod chat;
pub mod env;
pub mod error;
pub mod mailbox;
pub mod participant;
pub mod service;
pub mod store;
pub mod wellness;

pub use chat::{ChatAction, ChatEvent, ChatRuntime, FriendsChat, Notice, NoticeLevel};
pub use env::{Environment, SystemEnv};
pub use error::{DirectoryError, MailboxError, StoreError};
pub use mailbox::{DeliveryReceipt, MailboxPath, MailboxRecord, MailboxStore, StoredRecord};
pub use participant::{ParticipantId, Session};
pub use service::{MailboxConfig, MessageBody, OpenedMessage, SecureMailbox};
pub use store::{Document, DocumentStore, MemoryStore, RecordKey, StorePath};
pub use wellness::{IdentityProvider, MemoryIdentities, Mood, MoodTracker, UserRecords};
