//! Journal entries.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::UserRecords;
use crate::{
    env::{Environment, iso_timestamp},
    error::DirectoryError,
    participant::Session,
    store::{DocumentStore, from_document, to_document},
};

/// Root of all journals.
pub const JOURNALS_ROOT: &str = "journals";

/// One journal entry with its summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Text as written by the user.
    pub entry: String,
    /// Caller-supplied summary. May be empty.
    pub summary: String,
    /// ISO-8601 time of writing.
    pub timestamp: String,
}

impl<S: DocumentStore, E: Environment> UserRecords<S, E> {
    /// Save a journal entry for the session user.
    ///
    /// The entry text is stored as written; only blank entries are rejected.
    pub fn add_journal_entry(
        &self,
        session: &Session,
        entry: &str,
        summary: &str,
    ) -> Result<JournalEntry, DirectoryError> {
        if entry.trim().is_empty() {
            return Err(DirectoryError::MissingField("entry"));
        }

        let journal = JournalEntry {
            entry: entry.to_string(),
            summary: summary.trim().to_string(),
            timestamp: iso_timestamp(self.env.now()),
        };

        let path = Self::list_path(JOURNALS_ROOT, session.user())?;
        let key = self.store.push(&path, to_document(&journal)?)?;
        debug!(user = %session.user(), %key, "journal entry saved");
        Ok(journal)
    }

    /// The session user's journal, oldest first.
    pub fn journal(&self, session: &Session) -> Result<Vec<JournalEntry>, DirectoryError> {
        let path = Self::list_path(JOURNALS_ROOT, session.user())?;
        let entries = self.store.read_ordered_by(&path, "timestamp")?;

        Ok(entries
            .into_iter()
            .filter_map(|(_, document)| from_document::<JournalEntry>(&document).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wellness::test_support::{records, session};

    #[test]
    fn entries_are_listed_oldest_first() {
        let records = records();
        let alice = session("alice");

        records.add_journal_entry(&alice, "Long day.\n", "A tiring day").unwrap();
        records.add_journal_entry(&alice, "Better today", "").unwrap();

        let journal = records.journal(&alice).unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].entry, "Long day.\n");
        assert_eq!(journal[0].summary, "A tiring day");
        assert_eq!(journal[1].entry, "Better today");
        assert!(journal[0].timestamp < journal[1].timestamp);
    }

    #[test]
    fn blank_entry_rejected() {
        let records = records();
        assert_eq!(
            records.add_journal_entry(&session("alice"), " \n\t", "summary"),
            Err(DirectoryError::MissingField("entry"))
        );
        assert!(records.journal(&session("alice")).unwrap().is_empty());
    }
}
