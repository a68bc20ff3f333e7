//! Emergency contacts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{UserRecords, identity::normalize_email, required};
use crate::{
    env::Environment,
    error::DirectoryError,
    participant::Session,
    store::{DocumentStore, to_document},
};

/// Root of all emergency contact lists.
pub const CONTACTS_ROOT: &str = "emergency_contacts";

/// Person notified when a low-mood streak is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Display name.
    pub name: String,
    /// Notification address.
    pub email: String,
}

impl<S: DocumentStore, E: Environment> UserRecords<S, E> {
    /// Save an emergency contact for the session user.
    ///
    /// Both fields are trimmed. A contact whose email is already saved
    /// (case-insensitive) is rejected before blank fields are checked.
    pub fn add_contact(
        &self,
        session: &Session,
        name: &str,
        email: &str,
    ) -> Result<EmergencyContact, DirectoryError> {
        let wanted = normalize_email(email);
        if !wanted.is_empty()
            && self.contacts(session)?.iter().any(|c| normalize_email(&c.email) == wanted)
        {
            return Err(DirectoryError::DuplicateContact { email: email.trim().to_string() });
        }

        let contact =
            EmergencyContact { name: required(name, "name")?, email: required(email, "email")? };

        let path = Self::list_path(CONTACTS_ROOT, session.user())?;
        let key = self.store.push(&path, to_document(&contact)?)?;
        debug!(user = %session.user(), %key, "emergency contact saved");
        Ok(contact)
    }

    /// The session user's emergency contacts in the order they were added.
    pub fn contacts(&self, session: &Session) -> Result<Vec<EmergencyContact>, DirectoryError> {
        Ok(self
            .read_list::<EmergencyContact>(CONTACTS_ROOT, session.user())?
            .into_iter()
            .map(|(_, contact)| contact)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wellness::test_support::{records, session};

    #[test]
    fn add_and_list() {
        let records = records();
        let alice = session("alice");

        let saved = records.add_contact(&alice, " Mum ", " mum@example.com").unwrap();
        assert_eq!(saved, EmergencyContact { name: "Mum".into(), email: "mum@example.com".into() });
        assert_eq!(records.contacts(&alice).unwrap(), vec![saved]);
    }

    #[test]
    fn rejects_duplicate_email() {
        let records = records();
        let alice = session("alice");

        records.add_contact(&alice, "Mum", "mum@example.com").unwrap();
        assert_eq!(
            records.add_contact(&alice, "Mother", "MUM@example.com"),
            Err(DirectoryError::DuplicateContact { email: "MUM@example.com".into() })
        );
    }

    #[test]
    fn rejects_blank_fields() {
        let records = records();
        let alice = session("alice");

        assert_eq!(
            records.add_contact(&alice, "", "mum@example.com"),
            Err(DirectoryError::MissingField("name"))
        );
        assert_eq!(records.add_contact(&alice, "Mum", " "), Err(DirectoryError::MissingField("email")));
        assert!(records.contacts(&alice).unwrap().is_empty());
    }
}
