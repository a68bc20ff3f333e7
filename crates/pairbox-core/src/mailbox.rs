//! Mailbox store adapter.
//!
//! A conversation between A and B lives in two mailboxes,
//! `chats/A/B` and `chats/B/A`, so each participant reads only their own
//! subtree. Every send writes the same record to both.
//!
//! # Consistency
//!
//! The two writes are independent store calls. If the second fails the
//! mailboxes diverge permanently; [`MailboxError::PartialWrite`] reports
//! this, nothing reconciles it.
//!
//! # Retention
//!
//! After each write the mailbox is pruned to the newest `keep` records by
//! timestamp. Pruned records are deleted, not archived. Pruning is a
//! read-then-delete sequence and is not safe against a concurrent prune of
//! the same mailbox.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    error::{MailboxError, StoreError},
    participant::ParticipantId,
    store::{DocumentStore, RecordKey, StorePath, from_document, to_document},
};

/// Root of all mailboxes.
pub const CHATS_ROOT: &str = "chats";

/// Field mailboxes are ordered by.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// One message as persisted in a mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxRecord {
    /// Identifier of the participant who sent it.
    pub sender: String,
    /// Sealed payload (or plaintext for records written before sealing).
    pub text: String,
    /// ISO-8601 creation time.
    pub timestamp: String,
}

/// A record together with its store-assigned key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Store-assigned key (ordering tie-break and delete handle).
    pub key: RecordKey,
    /// The record.
    pub record: MailboxRecord,
}

/// Address of one participant's copy of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MailboxPath {
    owner: ParticipantId,
    counterpart: ParticipantId,
}

impl MailboxPath {
    /// Mailbox of `owner` for the conversation with `counterpart`.
    pub fn new(owner: ParticipantId, counterpart: ParticipantId) -> Self {
        Self { owner, counterpart }
    }

    /// Participant who reads this copy.
    pub fn owner(&self) -> &ParticipantId {
        &self.owner
    }

    /// The other participant.
    pub fn counterpart(&self) -> &ParticipantId {
        &self.counterpart
    }

    /// The other participant's copy of the same conversation.
    pub fn mirrored(&self) -> Self {
        Self { owner: self.counterpart.clone(), counterpart: self.owner.clone() }
    }

    /// `chats/{owner}/{counterpart}`.
    pub fn store_path(&self) -> Result<StorePath, StoreError> {
        StorePath::from_segments([CHATS_ROOT, self.owner.as_str(), self.counterpart.as_str()])
    }
}

impl fmt::Display for MailboxPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CHATS_ROOT}/{}/{}", self.owner, self.counterpart)
    }
}

/// Outcome of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Key of the record in the sender's mailbox.
    pub sender_copy: RecordKey,
    /// Key of the record in the receiver's mailbox.
    pub receiver_copy: RecordKey,
    /// Records removed by retention across both mailboxes.
    pub pruned: usize,
    /// Mailboxes whose prune step failed (left over the limit).
    pub prune_failures: usize,
}

/// Append, ordered fetch, and retention over a [`DocumentStore`].
#[derive(Debug)]
pub struct MailboxStore<S> {
    store: S,
}

impl<S: DocumentStore> MailboxStore<S> {
    /// Wrap a document store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write `record` into one mailbox.
    #[instrument(level = "debug", skip_all, fields(mailbox = %mailbox))]
    pub fn append(
        &self,
        mailbox: &MailboxPath,
        record: &MailboxRecord,
    ) -> Result<RecordKey, StoreError> {
        let key = self.store.push(&mailbox.store_path()?, to_document(record)?)?;
        debug!(%key, "record appended");
        Ok(key)
    }

    /// All records of one mailbox, oldest first.
    ///
    /// Ordered by timestamp, ties by record key. A mailbox that does not
    /// exist yet is empty. Documents that do not decode as records are
    /// skipped.
    pub fn fetch_ordered(&self, mailbox: &MailboxPath) -> Result<Vec<StoredRecord>, StoreError> {
        let entries = self.store.read_ordered_by(&mailbox.store_path()?, TIMESTAMP_FIELD)?;

        let mut records: Vec<StoredRecord> = entries
            .into_iter()
            .filter_map(|(key, document)| match from_document::<MailboxRecord>(&document) {
                Ok(record) => Some(StoredRecord { key, record }),
                Err(error) => {
                    warn!(mailbox = %mailbox, %key, %error, "skipping undecodable record");
                    None
                },
            })
            .collect();

        records.sort_by(|a, b| {
            a.record.timestamp.cmp(&b.record.timestamp).then_with(|| a.key.cmp(&b.key))
        });
        Ok(records)
    }

    /// Delete the oldest records until at most `keep` remain.
    ///
    /// Returns the number of records deleted.
    #[instrument(level = "debug", skip(self, mailbox), fields(mailbox = %mailbox))]
    pub fn prune(&self, mailbox: &MailboxPath, keep: usize) -> Result<usize, StoreError> {
        let path = mailbox.store_path()?;
        let entries = self.store.read_ordered_by(&path, TIMESTAMP_FIELD)?;

        let excess = entries.len().saturating_sub(keep);
        for (key, _) in &entries[..excess] {
            self.store.delete(&path.record(key)?)?;
        }

        if excess > 0 {
            debug!(removed = excess, kept = keep, "mailbox pruned");
        }
        Ok(excess)
    }

    /// Write `record` to the sender's and the receiver's mailbox, pruning
    /// each to `keep` records after its write.
    ///
    /// # Errors
    ///
    /// - `Store` if the sender's copy could not be written (nothing stored)
    /// - `PartialWrite` if the sender's copy was written but the receiver's
    ///   was not
    pub fn deliver(
        &self,
        sender: &ParticipantId,
        receiver: &ParticipantId,
        record: &MailboxRecord,
        keep: usize,
    ) -> Result<DeliveryReceipt, MailboxError> {
        let outbox = MailboxPath::new(sender.clone(), receiver.clone());
        let inbox = outbox.mirrored();

        let mut pruned = 0;
        let mut prune_failures = 0;
        let mut prune = |mailbox: &MailboxPath| match self.prune(mailbox, keep) {
            Ok(removed) => pruned += removed,
            Err(error) => {
                warn!(mailbox = %mailbox, %error, "prune failed; mailbox left over limit");
                prune_failures += 1;
            },
        };

        let sender_copy = self.append(&outbox, record)?;
        prune(&outbox);

        let receiver_copy = match self.append(&inbox, record) {
            Ok(key) => key,
            Err(source) => {
                warn!(written = %outbox, missing = %inbox, error = %source, "partial write");
                return Err(MailboxError::PartialWrite {
                    written: outbox.to_string(),
                    missing: inbox.to_string(),
                    source,
                });
            },
        };
        prune(&inbox);

        Ok(DeliveryReceipt { sender_copy, receiver_copy, pruned, prune_failures })
    }
}
