//! Per-user wellness records.
//!
//! Each user owns one list per record kind, stored as push-keyed children:
//!
//! ```text
//! friends/{uid}/{key}            { friend_uid, email }
//! emergency_contacts/{uid}/{key} { name, email }
//! moods/{uid}/{key}              { mood, score, timestamp }
//! journals/{uid}/{key}           { entry, summary, timestamp }
//! ```
//!
//! Lists are append-only. Duplicate checks are read-then-push and carry the
//! same race as mailbox pruning.

mod contacts;
mod friends;
mod identity;
mod journal;
mod mood;

use serde::de::DeserializeOwned;
use tracing::warn;

pub use contacts::{CONTACTS_ROOT, EmergencyContact};
pub use friends::{FRIENDS_ROOT, FriendRecord};
pub use identity::{IdentityProvider, MemoryIdentities, normalize_email};
pub use journal::{JOURNALS_ROOT, JournalEntry};
pub use mood::{
    LOW_MOOD_STREAK, MOOD_WINDOW, MOODS_ROOT, Mood, MoodEntry, MoodOutcome, MoodTracker,
    StreakAlert,
};

use crate::{
    env::Environment,
    error::{DirectoryError, StoreError},
    participant::ParticipantId,
    store::{DocumentStore, RecordKey, StorePath, from_document},
};

/// Friends, emergency contacts, mood log, and journal over a document store.
pub struct UserRecords<S, E> {
    store: S,
    env: E,
}

impl<S: DocumentStore, E: Environment> UserRecords<S, E> {
    /// Records stored in `store`.
    pub fn new(store: S, env: E) -> Self {
        Self { store, env }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn list_path(root: &str, user: &ParticipantId) -> Result<StorePath, StoreError> {
        StorePath::from_segments([root, user.as_str()])
    }

    /// Decode every child of `root/user`, in key order. Undecodable children
    /// are skipped.
    fn read_list<T: DeserializeOwned>(
        &self,
        root: &str,
        user: &ParticipantId,
    ) -> Result<Vec<(RecordKey, T)>, DirectoryError> {
        let path = Self::list_path(root, user)?;
        let entries = self.store.read(&path)?;

        Ok(entries
            .into_iter()
            .filter_map(|(key, document)| match from_document::<T>(&document) {
                Ok(value) => Some((key, value)),
                Err(error) => {
                    warn!(%path, %key, %error, "skipping undecodable entry");
                    None
                },
            })
            .collect())
    }
}

/// Trim `value`, rejecting it if nothing is left.
fn required(value: &str, name: &'static str) -> Result<String, DirectoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DirectoryError::MissingField(name));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    };

    use chrono::{DateTime, TimeZone, Utc};

    use super::UserRecords;
    use crate::{env::Environment, participant::Session, store::MemoryStore};

    /// Clock that advances one second per reading.
    #[derive(Clone, Default)]
    pub(crate) struct TickEnv {
        ticks: Arc<AtomicI64>,
    }

    impl Environment for TickEnv {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap() + chrono::Duration::seconds(tick)
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            buffer.fill(7);
        }
    }

    pub(crate) fn records() -> UserRecords<MemoryStore<TickEnv>, TickEnv> {
        let env = TickEnv::default();
        UserRecords::new(MemoryStore::new(env.clone()), env)
    }

    pub(crate) fn session(name: &str) -> Session {
        Session::new(
            crate::participant::ParticipantId::new(name).unwrap(),
            format!("{name}@example.com"),
        )
    }
}
