//! Participant identifiers and the per-request session context.

use std::fmt;

use crate::store::validate_segment;

/// Opaque, stable user identifier issued by the identity provider.
///
/// Identifiers name store path segments (`chats/{owner}/{counterpart}`), so
/// they must be non-empty and free of path-reserved characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Validate and wrap an identifier.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason when `id` is empty or contains `/ . # $
    /// [ ]` or control characters.
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        validate_segment(&id)?;
        Ok(Self(id))
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ParticipantId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Request-scoped context of the signed-in user.
///
/// Passed explicitly to every operation in place of ambient session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: ParticipantId,
    email: String,
    demo: bool,
}

impl Session {
    /// Session for an authenticated user.
    pub fn new(user: ParticipantId, email: impl Into<String>) -> Self {
        Self { user, email: email.into(), demo: false }
    }

    /// Demo session. Mood entries are tracked but never persisted.
    pub fn demo(user: ParticipantId, email: impl Into<String>) -> Self {
        Self { user, email: email.into(), demo: true }
    }

    /// Signed-in user.
    pub fn user(&self) -> &ParticipantId {
        &self.user
    }

    /// Email of the signed-in user.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// True for demo sessions.
    pub fn is_demo(&self) -> bool {
        self.demo
    }
}
