//! Friends list.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{IdentityProvider, UserRecords, identity::normalize_email, required};
use crate::{
    env::Environment,
    error::DirectoryError,
    participant::{ParticipantId, Session},
    store::{DocumentStore, to_document},
};

/// Root of all friends lists.
pub const FRIENDS_ROOT: &str = "friends";

/// A friend as stored in the user's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRecord {
    /// The friend's participant identifier.
    pub friend_uid: String,
    /// Email the friend was added by.
    pub email: String,
}

impl FriendRecord {
    /// The friend's identifier, if it is still a valid participant id.
    pub fn participant(&self) -> Option<ParticipantId> {
        ParticipantId::new(self.friend_uid.as_str()).ok()
    }
}

impl<S: DocumentStore, E: Environment> UserRecords<S, E> {
    /// Add the account registered under `email` to the session user's
    /// friends.
    ///
    /// # Errors
    ///
    /// - `MissingField` if `email` is blank
    /// - `UserNotFound` if no account uses `email`
    /// - `AlreadyFriend` if `email` is on the list (case-insensitive)
    /// - `SelfFriend` if `email` belongs to the session user
    #[instrument(level = "debug", skip_all, fields(user = %session.user()))]
    pub fn add_friend(
        &self,
        session: &Session,
        identities: &impl IdentityProvider,
        email: &str,
    ) -> Result<FriendRecord, DirectoryError> {
        let email = required(email, "email")?;
        let friend = identities
            .lookup_email(&email)?
            .ok_or_else(|| DirectoryError::UserNotFound { email: email.clone() })?;

        let wanted = normalize_email(&email);
        let existing = self.friends(session)?;
        if existing.iter().any(|f| normalize_email(&f.email) == wanted) {
            return Err(DirectoryError::AlreadyFriend { email });
        }
        if &friend == session.user() {
            return Err(DirectoryError::SelfFriend);
        }

        let record = FriendRecord { friend_uid: friend.to_string(), email };
        let path = Self::list_path(FRIENDS_ROOT, session.user())?;
        let key = self.store.push(&path, to_document(&record)?)?;
        debug!(%key, friend = %friend, "friend added");
        Ok(record)
    }

    /// The session user's friends in the order they were added.
    pub fn friends(&self, session: &Session) -> Result<Vec<FriendRecord>, DirectoryError> {
        Ok(self
            .read_list::<FriendRecord>(FRIENDS_ROOT, session.user())?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// Resolve `email` against the session user's friends list.
    ///
    /// Conversations are only opened with friends, so this gates every
    /// mailbox operation a user starts.
    ///
    /// # Errors
    ///
    /// - `NotAFriend` if no friend was added under `email` (case-insensitive)
    /// - `InvalidParticipant` if the stored friend id is unusable
    pub fn require_friend(
        &self,
        session: &Session,
        email: &str,
    ) -> Result<ParticipantId, DirectoryError> {
        let wanted = normalize_email(email);
        let friend = self
            .friends(session)?
            .into_iter()
            .find(|f| normalize_email(&f.email) == wanted)
            .ok_or_else(|| DirectoryError::NotAFriend { email: email.trim().to_string() })?;

        ParticipantId::new(friend.friend_uid.as_str())
            .map_err(|reason| DirectoryError::InvalidParticipant { id: friend.friend_uid, reason })
    }
}
