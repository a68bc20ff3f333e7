//! Reference model of the secure mailbox.
//!
//! [`ModelWorld`] is the simplest thing that could be correct: a map from
//! (owner, counterpart) to a bounded queue of plaintexts. [`RealWorld`] runs
//! the same operations through [`SecureMailbox`] over a [`MemoryStore`].
//! Model-based tests and the fuzzer apply one operation sequence to both and
//! require identical results.

use std::{
    collections::{BTreeMap, VecDeque},
    num::NonZeroUsize,
    sync::Arc,
    time::Duration,
};

use arbitrary::Arbitrary;
use pairbox_core::{
    MailboxConfig, MailboxError, MailboxPath, MemoryStore, ParticipantId, SecureMailbox, Session,
};

use crate::SimEnv;

/// Index of a simulated participant. Reduced modulo [`PARTICIPANTS`].
pub type ParticipantIndex = u8;

/// Number of simulated participants.
pub const PARTICIPANTS: usize = 4;

/// Short message text, sometimes blank.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub struct SmallMessage {
    /// Selects the word; every eighth value is blank.
    pub word: u8,
    /// Surround the text with whitespace.
    pub padded: bool,
}

impl SmallMessage {
    /// Text as typed by the user.
    pub fn text(&self) -> String {
        let body = if self.word % 8 == 0 { String::new() } else { format!("msg-{}", self.word) };
        if self.padded { format!("  {body}\n") } else { body }
    }
}

/// One step of a simulated session.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// `from` sends `message` to `to`.
    Send {
        /// Sender.
        from: ParticipantIndex,
        /// Receiver.
        to: ParticipantIndex,
        /// Message text.
        message: SmallMessage,
    },
    /// `owner` reads their copy of the conversation with `counterpart`.
    Fetch {
        /// Reader.
        owner: ParticipantIndex,
        /// Other participant.
        counterpart: ParticipantIndex,
    },
    /// Move the simulated clock forward.
    AdvanceTime {
        /// Milliseconds to advance; zero keeps sends in one millisecond.
        millis: u16,
    },
}

/// Observable outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Succeeded with nothing to report.
    Ok,
    /// Fetched `(sender, text)` pairs, oldest first.
    Messages(Vec<(String, String)>),
    /// Rejected.
    Error(OperationError),
}

/// Expected rejections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// Sender and receiver are the same.
    SelfConversation,
    /// Blank message.
    EmptyMessage,
    /// Anything the model never produces.
    Unexpected(String),
}

fn participant_name(index: ParticipantIndex) -> String {
    format!("p{}", usize::from(index) % PARTICIPANTS)
}

fn participant_slot(index: ParticipantIndex) -> usize {
    usize::from(index) % PARTICIPANTS
}

/// Reference model.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    retention: usize,
    mailboxes: BTreeMap<(usize, usize), VecDeque<(String, String)>>,
}

impl ModelWorld {
    /// Empty model keeping `retention` messages per mailbox.
    pub fn new(retention: NonZeroUsize) -> Self {
        Self { retention: retention.get(), mailboxes: BTreeMap::new() }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Send { from, to, message } => {
                let text = message.text();
                let text = text.trim();
                if text.is_empty() {
                    return OperationResult::Error(OperationError::EmptyMessage);
                }
                let (from, to) = (participant_slot(*from), participant_slot(*to));
                if from == to {
                    return OperationResult::Error(OperationError::SelfConversation);
                }

                let entry = (format!("p{from}"), text.to_string());
                for key in [(from, to), (to, from)] {
                    let mailbox = self.mailboxes.entry(key).or_default();
                    mailbox.push_back(entry.clone());
                    while mailbox.len() > self.retention {
                        mailbox.pop_front();
                    }
                }
                OperationResult::Ok
            },
            Operation::Fetch { owner, counterpart } => {
                let key = (participant_slot(*owner), participant_slot(*counterpart));
                if key.0 == key.1 {
                    return OperationResult::Error(OperationError::SelfConversation);
                }
                OperationResult::Messages(
                    self.mailboxes.get(&key).map(|m| m.iter().cloned().collect()).unwrap_or_default(),
                )
            },
            Operation::AdvanceTime { .. } => OperationResult::Ok,
        }
    }

    /// Messages held for `owner` with `counterpart`.
    pub fn mailbox_len(&self, owner: ParticipantIndex, counterpart: ParticipantIndex) -> usize {
        self.mailboxes
            .get(&(participant_slot(owner), participant_slot(counterpart)))
            .map_or(0, VecDeque::len)
    }
}

/// The real mailbox service wrapped in the model's interface.
pub struct RealWorld {
    env: SimEnv,
    store: Arc<MemoryStore<SimEnv>>,
    service: SecureMailbox<Arc<MemoryStore<SimEnv>>, SimEnv>,
    sessions: Vec<Session>,
}

impl RealWorld {
    /// Fresh store and service with the given seed and retention.
    pub fn new(seed: u64, retention: NonZeroUsize) -> Self {
        let env = SimEnv::with_seed(seed);
        let store = Arc::new(MemoryStore::new(env.clone()));
        let service =
            SecureMailbox::new(Arc::clone(&store), env.clone(), MailboxConfig { retention });

        let sessions = (0..PARTICIPANTS as u8)
            .filter_map(|i| {
                let name = participant_name(i);
                let id = ParticipantId::new(name.as_str()).ok()?;
                Some(Session::new(id, format!("{name}@sim.test")))
            })
            .collect();

        Self { env, store, service, sessions }
    }

    /// Apply one operation.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Send { from, to, message } => {
                let (sender, receiver) = (self.session(*from), self.session(*to));
                match self.service.send(sender, receiver.user(), &message.text()) {
                    Ok(_) => OperationResult::Ok,
                    Err(error) => OperationResult::Error(map_error(error)),
                }
            },
            Operation::Fetch { owner, counterpart } => {
                let (owner, counterpart) = (self.session(*owner), self.session(*counterpart));
                match self.service.fetch(owner, counterpart.user()) {
                    Ok(messages) => OperationResult::Messages(
                        messages
                            .into_iter()
                            .map(|m| (m.sender, m.body.display_text().to_string()))
                            .collect(),
                    ),
                    Err(error) => OperationResult::Error(map_error(error)),
                }
            },
            Operation::AdvanceTime { millis } => {
                self.env.advance(Duration::from_millis(u64::from(*millis)));
                OperationResult::Ok
            },
        }
    }

    /// Records stored for `owner` with `counterpart`, read straight from the
    /// store.
    pub fn mailbox_len(&self, owner: ParticipantIndex, counterpart: ParticipantIndex) -> usize {
        let path = MailboxPath::new(
            self.session(owner).user().clone(),
            self.session(counterpart).user().clone(),
        );
        self.service.mailbox().fetch_ordered(&path).map_or(0, |records| records.len())
    }

    /// Total documents in the store.
    pub fn document_count(&self) -> usize {
        self.store.len()
    }

    fn session(&self, index: ParticipantIndex) -> &Session {
        &self.sessions[participant_slot(index) % self.sessions.len()]
    }
}

fn map_error(error: MailboxError) -> OperationError {
    match error {
        MailboxError::SelfConversation => OperationError::SelfConversation,
        MailboxError::EmptyMessage => OperationError::EmptyMessage,
        other => OperationError::Unexpected(other.to_string()),
    }
}
