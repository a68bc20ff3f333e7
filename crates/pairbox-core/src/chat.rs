//! Friends chat state machine
//!
//! [`FriendsChat`] is a pure state machine: it consumes [`ChatEvent`]s and
//! produces [`ChatAction`]s without touching the store. [`ChatRuntime`]
//! executes `Send` and `Fetch` against a [`SecureMailbox`] and feeds the
//! results back as events, so the same state machine runs in tests and in
//! the interactive CLI.
//!
//! ```text
//! host ──ChatEvent──► FriendsChat ──ChatAction──► ChatRuntime
//!   ▲                      ▲                          │
//!   │                      └── Delivered / Fetched ───┤
//!   └──────────── Render / Notice ────────────────────┘
//! ```
//!
//! Mailbox calls only happen in response to a selection, a submit, or an
//! explicit refresh.

use std::{collections::VecDeque, fmt};

use tracing::debug;

use crate::{
    env::Environment,
    error::MailboxError,
    mailbox::DeliveryReceipt,
    participant::{ParticipantId, Session},
    service::{OpenedMessage, SecureMailbox},
    store::DocumentStore,
};

/// Label used for the session user's own messages.
pub const SELF_LABEL: &str = "You";

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// The request was not carried out.
    Warning,
    /// The request failed.
    Error,
}

/// User-visible message produced at an operation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Message text.
    pub text: String,
}

impl Notice {
    /// Informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, text: text.into() }
    }

    /// Warning notice.
    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, text: text.into() }
    }

    /// Error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, text: text.into() }
    }

    /// Convert a mailbox failure into what the user sees.
    pub fn from_mailbox_error(error: &MailboxError) -> Self {
        match error {
            MailboxError::EmptyMessage => Self::warning("Please enter a message."),
            MailboxError::SelfConversation => Self::warning("You cannot chat with yourself."),
            MailboxError::InvalidParticipant { .. } | MailboxError::Encryption(_) => {
                Self::error(error.to_string())
            },
            MailboxError::PartialWrite { .. } => {
                Self::error(format!("Message saved on your side only: {error}"))
            },
            MailboxError::Store(source) => Self::error(format!("Message store error: {source}")),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Inputs to the chat state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The user picked a friend to chat with.
    SelectFriend {
        /// Friend identifier.
        friend: ParticipantId,
        /// Display label (usually the friend's email).
        label: String,
    },

    /// The user submitted a message.
    Submit {
        /// Raw input text.
        text: String,
    },

    /// The user asked to reload the conversation.
    Refresh,

    /// A send completed.
    Delivered {
        /// Delivery outcome.
        receipt: DeliveryReceipt,
    },

    /// A fetch completed.
    Fetched {
        /// Conversation the messages belong to.
        friend: ParticipantId,
        /// Messages, oldest first.
        messages: Vec<OpenedMessage>,
    },

    /// A mailbox call failed.
    Failed {
        /// What to show the user.
        notice: Notice,
    },
}

/// Outputs of the chat state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    /// Seal and deliver a message.
    Send {
        /// Receiver.
        to: ParticipantId,
        /// Trimmed message text.
        text: String,
    },

    /// Load the conversation with a friend.
    Fetch {
        /// Counterpart.
        with: ParticipantId,
    },

    /// The transcript changed.
    Render,

    /// Show a notice.
    Notice(Notice),
}

/// One rendered transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// `"You"` or the friend's label.
    pub author: String,
    /// Message text or the decryption placeholder.
    pub text: String,
    /// ISO-8601 creation time.
    pub timestamp: String,
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    friend: ParticipantId,
    label: String,
}

/// Chat view state for one session user.
#[derive(Debug, Clone)]
pub struct FriendsChat {
    me: ParticipantId,
    selected: Option<Selection>,
    messages: Vec<OpenedMessage>,
}

impl FriendsChat {
    /// Empty chat for `me` with no friend selected.
    pub fn new(me: ParticipantId) -> Self {
        Self { me, selected: None, messages: Vec::new() }
    }

    /// Currently selected friend.
    pub fn selected(&self) -> Option<&ParticipantId> {
        self.selected.as_ref().map(|s| &s.friend)
    }

    /// Loaded messages of the selected conversation.
    pub fn messages(&self) -> &[OpenedMessage] {
        &self.messages
    }

    /// Process one event.
    pub fn handle(&mut self, event: ChatEvent) -> Vec<ChatAction> {
        match event {
            ChatEvent::SelectFriend { friend, label } => {
                let unchanged = self.selected.as_ref().is_some_and(|s| s.friend == friend);
                if !unchanged {
                    self.messages.clear();
                }
                self.selected = Some(Selection { friend: friend.clone(), label });
                vec![ChatAction::Render, ChatAction::Fetch { with: friend }]
            },

            ChatEvent::Submit { text } => {
                let Some(selection) = &self.selected else {
                    return vec![ChatAction::Notice(Notice::warning("Select a friend to chat"))];
                };
                let text = text.trim();
                if text.is_empty() {
                    return vec![ChatAction::Notice(Notice::warning("Please enter a message."))];
                }
                vec![ChatAction::Send { to: selection.friend.clone(), text: text.to_string() }]
            },

            ChatEvent::Refresh => match &self.selected {
                Some(selection) => vec![ChatAction::Fetch { with: selection.friend.clone() }],
                None => vec![ChatAction::Notice(Notice::warning("Select a friend to chat"))],
            },

            ChatEvent::Delivered { receipt } => {
                let mut actions = Vec::new();
                if receipt.prune_failures > 0 {
                    actions.push(ChatAction::Notice(Notice::warning(
                        "Message sent, but old messages could not be cleaned up.",
                    )));
                }
                if let Some(selection) = &self.selected {
                    actions.push(ChatAction::Fetch { with: selection.friend.clone() });
                }
                actions
            },

            ChatEvent::Fetched { friend, messages } => {
                if self.selected().is_some_and(|selected| *selected == friend) {
                    self.messages = messages;
                    vec![ChatAction::Render]
                } else {
                    debug!(%friend, "dropping stale fetch result");
                    Vec::new()
                }
            },

            ChatEvent::Failed { notice } => vec![ChatAction::Notice(notice)],
        }
    }

    /// Transcript of the selected conversation, oldest first.
    pub fn lines(&self) -> Vec<ChatLine> {
        let friend_label = self.selected.as_ref().map_or("", |s| s.label.as_str());
        self.messages
            .iter()
            .map(|message| ChatLine {
                author: if message.is_from(&self.me) {
                    SELF_LABEL.to_string()
                } else {
                    friend_label.to_string()
                },
                text: message.body.display_text().to_string(),
                timestamp: message.timestamp.clone(),
            })
            .collect()
    }
}

/// Runs [`FriendsChat`] against a [`SecureMailbox`].
pub struct ChatRuntime<'a, S, E> {
    mailbox: &'a SecureMailbox<S, E>,
    session: Session,
    chat: FriendsChat,
}

impl<'a, S: DocumentStore, E: Environment> ChatRuntime<'a, S, E> {
    /// Runtime for the session user.
    pub fn new(mailbox: &'a SecureMailbox<S, E>, session: Session) -> Self {
        let chat = FriendsChat::new(session.user().clone());
        Self { mailbox, session, chat }
    }

    /// Chat state.
    pub fn chat(&self) -> &FriendsChat {
        &self.chat
    }

    /// Feed a host event through the state machine, executing every mailbox
    /// action it produces.
    ///
    /// Returns the `Render` and `Notice` actions for the host.
    pub fn dispatch(&mut self, event: ChatEvent) -> Vec<ChatAction> {
        let mut output = Vec::new();
        let mut pending: VecDeque<ChatAction> = self.chat.handle(event).into();

        while let Some(action) = pending.pop_front() {
            let follow_up = match action {
                ChatAction::Send { to, text } => {
                    match self.mailbox.send(&self.session, &to, &text) {
                        Ok(receipt) => ChatEvent::Delivered { receipt },
                        Err(error) => {
                            ChatEvent::Failed { notice: Notice::from_mailbox_error(&error) }
                        },
                    }
                },
                ChatAction::Fetch { with } => match self.mailbox.fetch(&self.session, &with) {
                    Ok(messages) => ChatEvent::Fetched { friend: with, messages },
                    Err(error) => ChatEvent::Failed { notice: Notice::from_mailbox_error(&error) },
                },
                ChatAction::Render | ChatAction::Notice(_) => {
                    output.push(action);
                    continue;
                },
            };
            pending.extend(self.chat.handle(follow_up));
        }

        output
    }
}
