//! Email to participant lookup.

use std::{collections::BTreeMap, sync::RwLock};

use crate::{error::StoreError, participant::ParticipantId};

/// Resolves account emails to participant identifiers.
///
/// Authentication itself is out of scope; this is the lookup the friends
/// list needs.
pub trait IdentityProvider {
    /// Identifier of the account registered under `email`, if any.
    ///
    /// Emails compare case-insensitively.
    fn lookup_email(&self, email: &str) -> Result<Option<ParticipantId>, StoreError>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn lookup_email(&self, email: &str) -> Result<Option<ParticipantId>, StoreError> {
        (**self).lookup_email(email)
    }
}

/// In-memory identity directory.
#[derive(Debug, Default)]
pub struct MemoryIdentities {
    by_email: RwLock<BTreeMap<String, ParticipantId>>,
}

impl MemoryIdentities {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user` under `email`, replacing any previous entry.
    pub fn register(&self, email: &str, user: ParticipantId) -> Result<(), StoreError> {
        self.by_email
            .write()
            .map_err(|_| StoreError::unavailable("identity lock poisoned"))?
            .insert(normalize_email(email), user);
        Ok(())
    }
}

impl IdentityProvider for MemoryIdentities {
    fn lookup_email(&self, email: &str) -> Result<Option<ParticipantId>, StoreError> {
        Ok(self
            .by_email
            .read()
            .map_err(|_| StoreError::unavailable("identity lock poisoned"))?
            .get(&normalize_email(email))
            .cloned())
    }
}

/// Canonical form of an email for lookups and duplicate checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
