//! Secure pairwise mailbox.
//!
//! Combines conversation key derivation, message sealing, and the mailbox
//! adapter:
//!
//! ```text
//! send:  derive(sender, receiver) → seal(text) → deliver(both copies) → prune
//! fetch: read own copy (ordered) → derive(owner, counterpart) → open each
//! ```
//!
//! The conversation key is derived per call and dropped before returning.

use std::{num::NonZeroUsize, sync::Mutex};

use chrono::{DateTime, Utc};
use pairbox_crypto::{
    DecryptionError, NONCE_RANDOM_SIZE, SealedMessage, decrypt_message, derive_conversation_key,
    encrypt_message,
};
use tracing::{debug, info_span};

use crate::{
    env::{Environment, iso_timestamp},
    error::MailboxError,
    mailbox::{DeliveryReceipt, MailboxPath, MailboxRecord, MailboxStore, StoredRecord},
    participant::{ParticipantId, Session},
    store::{DocumentStore, RecordKey},
};

/// Records kept per mailbox unless configured otherwise.
pub const DEFAULT_RETENTION: usize = 10;

/// Text shown in place of a message that could not be opened.
pub const DECRYPTION_PLACEHOLDER: &str = "[decryption error]";

/// Mailbox behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxConfig {
    /// Records kept per mailbox; older ones are deleted on each send.
    pub retention: NonZeroUsize,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self { retention: NonZeroUsize::new(DEFAULT_RETENTION).unwrap_or(NonZeroUsize::MIN) }
    }
}

/// Content of a fetched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Opened plaintext.
    Text(String),
    /// Payload could not be opened under the conversation key.
    Unreadable(DecryptionError),
}

impl MessageBody {
    /// Text to show for this message.
    pub fn display_text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Unreadable(_) => DECRYPTION_PLACEHOLDER,
        }
    }

    /// True if the payload was opened.
    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// A fetched and opened mailbox record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedMessage {
    /// Store-assigned key.
    pub key: RecordKey,
    /// Sender identifier as stored.
    pub sender: String,
    /// ISO-8601 creation time.
    pub timestamp: String,
    /// Opened content or the reason it could not be opened.
    pub body: MessageBody,
}

impl OpenedMessage {
    /// True if `participant` sent this message.
    pub fn is_from(&self, participant: &ParticipantId) -> bool {
        self.sender == participant.as_str()
    }
}

/// Sends and fetches sealed messages between pairs of participants.
pub struct SecureMailbox<S, E> {
    mailbox: MailboxStore<S>,
    env: E,
    config: MailboxConfig,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl<S: DocumentStore, E: Environment> SecureMailbox<S, E> {
    /// Mailbox service over `store`.
    pub fn new(store: S, env: E, config: MailboxConfig) -> Self {
        Self { mailbox: MailboxStore::new(store), env, config, last_stamp: Mutex::new(None) }
    }

    /// The underlying mailbox adapter.
    pub fn mailbox(&self) -> &MailboxStore<S> {
        &self.mailbox
    }

    /// Active configuration.
    pub fn config(&self) -> MailboxConfig {
        self.config
    }

    /// Seal `text` and deliver it from the session user to `to`.
    ///
    /// Text is trimmed before sealing.
    ///
    /// # Errors
    ///
    /// - `EmptyMessage` if `text` is blank
    /// - `SelfConversation` if `to` is the session user
    /// - `Encryption` if the text cannot be sealed
    /// - `Store` / `PartialWrite` from delivery
    pub fn send(
        &self,
        session: &Session,
        to: &ParticipantId,
        text: &str,
    ) -> Result<DeliveryReceipt, MailboxError> {
        let sender = session.user();
        let _span = info_span!("send", %sender, receiver = %to).entered();

        let text = text.trim();
        if text.is_empty() {
            return Err(MailboxError::EmptyMessage);
        }
        if sender == to {
            return Err(MailboxError::SelfConversation);
        }

        let mut nonce = [0u8; NONCE_RANDOM_SIZE];
        self.env.random_bytes(&mut nonce);

        let sealed = {
            let key = derive_conversation_key(sender.as_str(), to.as_str());
            encrypt_message(&key, text, nonce)?
        };

        let record = MailboxRecord {
            sender: sender.to_string(),
            text: sealed.encode(),
            timestamp: self.next_timestamp(),
        };

        let receipt = self.mailbox.deliver(sender, to, &record, self.config.retention.get())?;
        debug!(pruned = receipt.pruned, "message delivered");
        Ok(receipt)
    }

    /// Fetch and open the session user's copy of the conversation with
    /// `counterpart`, oldest first.
    ///
    /// Records that cannot be opened are returned as
    /// [`MessageBody::Unreadable`]; they never fail the whole fetch.
    pub fn fetch(
        &self,
        session: &Session,
        counterpart: &ParticipantId,
    ) -> Result<Vec<OpenedMessage>, MailboxError> {
        let owner = session.user();
        let _span = info_span!("fetch", %owner, %counterpart).entered();

        if owner == counterpart {
            return Err(MailboxError::SelfConversation);
        }

        let records =
            self.mailbox.fetch_ordered(&MailboxPath::new(owner.clone(), counterpart.clone()))?;

        let key = derive_conversation_key(owner.as_str(), counterpart.as_str());
        let opened: Vec<OpenedMessage> = records
            .into_iter()
            .map(|StoredRecord { key: record_key, record }| {
                let body = match SealedMessage::parse(&record.text)
                    .and_then(|sealed| decrypt_message(&key, &sealed))
                {
                    Ok(text) => MessageBody::Text(text),
                    Err(error) => {
                        debug!(key = %record_key, %error, "record unreadable");
                        MessageBody::Unreadable(error)
                    },
                };
                OpenedMessage {
                    key: record_key,
                    sender: record.sender,
                    timestamp: record.timestamp,
                    body,
                }
            })
            .collect();

        debug!(count = opened.len(), "mailbox fetched");
        Ok(opened)
    }

    /// Current time, never earlier than the last stamp this service issued.
    fn next_timestamp(&self) -> String {
        let now = self.env.now();
        let stamp = match self.last_stamp.lock() {
            Ok(mut last) => {
                let stamp = last.map_or(now, |previous| previous.max(now));
                *last = Some(stamp);
                stamp
            },
            Err(_) => now,
        };
        iso_timestamp(stamp)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicI64, AtomicU8, Ordering},
    };

    use chrono::TimeZone;

    use super::*;
    use crate::store::MemoryStore;

    /// Clock that moves by whatever offset the test sets.
    #[derive(Clone, Default)]
    struct StepEnv {
        offset_ms: Arc<AtomicI64>,
        counter: Arc<AtomicU8>,
    }

    impl StepEnv {
        fn set_offset_ms(&self, offset: i64) {
            self.offset_ms.store(offset, Ordering::SeqCst);
        }
    }

    impl Environment for StepEnv {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
                + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
        }

        fn random_bytes(&self, buffer: &mut [u8]) {
            let value = self.counter.fetch_add(1, Ordering::SeqCst);
            buffer.fill(value);
        }
    }

    fn id(name: &str) -> ParticipantId {
        ParticipantId::new(name).unwrap()
    }

    fn session(name: &str) -> Session {
        Session::new(id(name), format!("{name}@example.com"))
    }

    fn service(env: StepEnv) -> SecureMailbox<Arc<MemoryStore<StepEnv>>, StepEnv> {
        let store = Arc::new(MemoryStore::new(env.clone()));
        SecureMailbox::new(store, env, MailboxConfig::default())
    }

    #[test]
    fn default_retention_is_ten() {
        assert_eq!(MailboxConfig::default().retention.get(), 10);
    }

    #[test]
    fn send_then_fetch_both_sides() {
        let env = StepEnv::default();
        let mailbox = service(env.clone());

        mailbox.send(&session("alice"), &id("bob"), "  hello  ").unwrap();
        env.set_offset_ms(5);
        mailbox.send(&session("bob"), &id("alice"), "hi alice").unwrap();

        for (owner, counterpart) in [("alice", "bob"), ("bob", "alice")] {
            let messages = mailbox.fetch(&session(owner), &id(counterpart)).unwrap();
            let texts: Vec<&str> = messages.iter().map(|m| m.body.display_text()).collect();
            assert_eq!(texts, ["hello", "hi alice"]);
            assert!(messages[0].is_from(&id("alice")));
            assert!(messages[1].is_from(&id("bob")));
        }
    }

    #[test]
    fn stored_text_is_sealed() {
        let env = StepEnv::default();
        let mailbox = service(env);

        mailbox.send(&session("alice"), &id("bob"), "secret plans").unwrap();

        let stored = mailbox
            .mailbox()
            .fetch_ordered(&MailboxPath::new(id("bob"), id("alice")))
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].record.text.contains("secret"));
        assert!(SealedMessage::parse(&stored[0].record.text).is_ok());
    }

    #[test]
    fn blank_and_self_messages_rejected() {
        let mailbox = service(StepEnv::default());

        assert_eq!(
            mailbox.send(&session("alice"), &id("bob"), "   "),
            Err(MailboxError::EmptyMessage)
        );
        assert_eq!(
            mailbox.send(&session("alice"), &id("alice"), "hi"),
            Err(MailboxError::SelfConversation)
        );
        assert_eq!(mailbox.fetch(&session("alice"), &id("alice")), Err(MailboxError::SelfConversation));
    }

    #[test]
    fn plaintext_record_shows_placeholder() {
        let env = StepEnv::default();
        let mailbox = service(env);
        let path = MailboxPath::new(id("alice"), id("bob"));

        mailbox
            .mailbox()
            .append(
                &path,
                &MailboxRecord {
                    sender: "bob".into(),
                    text: "written before sealing".into(),
                    timestamp: "2025-06-01T11:00:00.000000Z".into(),
                },
            )
            .unwrap();
        mailbox.send(&session("alice"), &id("bob"), "sealed").unwrap();

        let messages = mailbox.fetch(&session("alice"), &id("bob")).unwrap();
        assert_eq!(messages.len(), 2);
        assert!(!messages[0].body.is_readable());
        assert_eq!(messages[0].body.display_text(), DECRYPTION_PLACEHOLDER);
        assert_eq!(messages[1].body, MessageBody::Text("sealed".into()));
    }

    #[test]
    fn clock_going_backwards_keeps_timestamps_ordered() {
        let env = StepEnv::default();
        let mailbox = service(env.clone());

        env.set_offset_ms(1_000);
        mailbox.send(&session("alice"), &id("bob"), "first").unwrap();
        env.set_offset_ms(0);
        mailbox.send(&session("alice"), &id("bob"), "second").unwrap();

        let messages = mailbox.fetch(&session("bob"), &id("alice")).unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.body.display_text()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert!(messages[0].timestamp <= messages[1].timestamp);
    }

    #[test]
    fn twelve_sends_keep_ten() {
        let env = StepEnv::default();
        let mailbox = service(env.clone());

        for i in 0..12 {
            env.set_offset_ms(i);
            mailbox.send(&session("alice"), &id("bob"), &format!("m{i}")).unwrap();
        }

        let messages = mailbox.fetch(&session("bob"), &id("alice")).unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.body.display_text()).collect();
        let expected: Vec<String> = (2..12).map(|i| format!("m{i}")).collect();
        assert_eq!(texts, expected);
    }
}
