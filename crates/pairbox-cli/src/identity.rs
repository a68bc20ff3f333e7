//! Account registry kept in the document store.
//!
//! Accounts live under `identities/{uid}` as `{ email }`. The uid is the push
//! key the store assigned at registration, so it is already a valid path
//! segment.

use ciborium::Value;
use pairbox_core::{
    DocumentStore, IdentityProvider, ParticipantId, StoreError, StorePath, store::field,
    wellness::normalize_email,
};
use tracing::info;

use crate::error::CliError;

/// Root of the account registry.
pub const IDENTITIES_ROOT: &str = "identities";

/// Email-keyed account directory over a document store.
pub struct StoreIdentities<S> {
    store: S,
}

impl<S: DocumentStore> StoreIdentities<S> {
    /// Directory stored in `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an account for `email` and return its identifier.
    pub fn register(&self, email: &str) -> Result<ParticipantId, CliError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CliError::InvalidEmail(email.to_string()));
        }
        if self.lookup_email(email)?.is_some() {
            return Err(CliError::AlreadyRegistered { email: email.to_string() });
        }

        let document =
            Value::Map(vec![(Value::Text("email".into()), Value::Text(email.to_string()))]);
        let key = self.store.push(&root()?, document)?;
        let id = ParticipantId::new(key.as_str()).map_err(|reason| {
            CliError::Store(StoreError::InvalidPath { path: key.to_string(), reason })
        })?;

        info!(user = %id, "account registered");
        Ok(id)
    }

    /// Resolve `email` or fail with [`CliError::UnknownUser`].
    pub fn require(&self, email: &str) -> Result<ParticipantId, CliError> {
        self.lookup_email(email)?
            .ok_or_else(|| CliError::UnknownUser { email: email.trim().to_string() })
    }

    /// All registered `(email, uid)` pairs in registration order.
    pub fn accounts(&self) -> Result<Vec<(String, ParticipantId)>, StoreError> {
        Ok(self
            .store
            .read(&root()?)?
            .into_iter()
            .filter_map(|(key, document)| {
                let email = field(&document, "email")?.as_text()?.to_string();
                let id = ParticipantId::new(key.as_str()).ok()?;
                Some((email, id))
            })
            .collect())
    }
}

impl<S: DocumentStore> IdentityProvider for StoreIdentities<S> {
    fn lookup_email(&self, email: &str) -> Result<Option<ParticipantId>, StoreError> {
        let wanted = normalize_email(email);
        Ok(self
            .accounts()?
            .into_iter()
            .find(|(stored, _)| normalize_email(stored) == wanted)
            .map(|(_, id)| id))
    }
}

fn root() -> Result<StorePath, StoreError> {
    StorePath::from_segments([IDENTITIES_ROOT])
}
