//! Command execution.
//!
//! [`Pairbox`] binds the mailbox service, user records, and account registry
//! to one document store and runs parsed [`Command`]s against it. Output goes
//! to any writer and interactive input comes from any reader, so whole
//! sessions can be scripted in tests.

use std::{
    io::{BufRead, Write},
    sync::Arc,
};

use pairbox_core::{
    ChatAction, ChatEvent, ChatRuntime, DocumentStore, Environment, Mood, MoodTracker, Notice,
    NoticeLevel, SecureMailbox, Session, UserRecords, wellness::MOOD_WINDOW,
};
use tracing::debug;

use crate::{
    cli::{CliConfig, Command, ContactAction, FriendAction, JournalAction, MoodAction},
    commands::{self, HELP},
    error::CliError,
    identity::StoreIdentities,
};

/// All services over one shared store.
pub struct Pairbox<S, E> {
    identities: StoreIdentities<Arc<S>>,
    records: UserRecords<Arc<S>, E>,
    mailbox: SecureMailbox<Arc<S>, E>,
    demo: bool,
}

impl<S: DocumentStore, E: Environment> Pairbox<S, E> {
    /// Services over `store`.
    pub fn new(store: S, env: E, config: &CliConfig) -> Self {
        let store = Arc::new(store);
        Self {
            identities: StoreIdentities::new(Arc::clone(&store)),
            records: UserRecords::new(Arc::clone(&store), env.clone()),
            mailbox: SecureMailbox::new(store, env, config.mailbox),
            demo: config.demo,
        }
    }

    /// Account registry.
    pub fn identities(&self) -> &StoreIdentities<Arc<S>> {
        &self.identities
    }

    /// Run one command as `user` (an account email).
    pub fn execute(
        &self,
        user: Option<&str>,
        command: Command,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        match command {
            Command::Register { email } => {
                let id = self.identities.register(&email)?;
                writeln!(out, "registered {} as {id}", email.trim())?;
            },

            Command::Accounts => {
                for (email, id) in self.identities.accounts()? {
                    writeln!(out, "{email}\t{id}")?;
                }
            },

            Command::Send { to, text } => {
                let session = self.session(user)?;
                let receiver = self.records.require_friend(&session, &to)?;
                let receipt = self.mailbox.send(&session, &receiver, &text)?;
                writeln!(out, "sent to {}", to.trim())?;
                if receipt.prune_failures > 0 {
                    writeln!(out, "warning: old messages could not be cleaned up")?;
                }
            },

            Command::Read { with } => {
                let session = self.session(user)?;
                let mut chat = ChatRuntime::new(&self.mailbox, session.clone());
                let actions = self.open_conversation(&session, &mut chat, &with)?;
                render(&chat, &actions, out)?;
            },

            Command::Friend { action } => self.friend(user, action, out)?,
            Command::Contact { action } => self.contact(user, action, out)?,
            Command::Mood { action } => self.mood(user, action, out)?,
            Command::Journal { action } => self.journal(user, action, out)?,
            Command::Chat { with } => self.chat(user, with.as_deref(), input, out)?,
        }
        Ok(())
    }

    fn session(&self, user: Option<&str>) -> Result<Session, CliError> {
        let email = user.ok_or(CliError::MissingUser)?.trim();
        let id = self.identities.require(email)?;
        Ok(if self.demo { Session::demo(id, email) } else { Session::new(id, email) })
    }

    /// Select a friend's conversation. Only friends of the session user can
    /// be opened.
    fn open_conversation(
        &self,
        session: &Session,
        chat: &mut ChatRuntime<'_, Arc<S>, E>,
        email: &str,
    ) -> Result<Vec<ChatAction>, CliError> {
        let friend = self.records.require_friend(session, email)?;
        Ok(chat.dispatch(ChatEvent::SelectFriend { friend, label: email.trim().to_string() }))
    }

    fn friend(
        &self,
        user: Option<&str>,
        action: FriendAction,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let session = self.session(user)?;
        match action {
            FriendAction::Add { email } => {
                let friend = self.records.add_friend(&session, &self.identities, &email)?;
                writeln!(out, "{} added as a friend", friend.email)?;
            },
            FriendAction::List => {
                let friends = self.records.friends(&session)?;
                if friends.is_empty() {
                    writeln!(out, "no friends added yet")?;
                }
                for friend in friends {
                    writeln!(out, "{}", friend.email)?;
                }
            },
        }
        Ok(())
    }

    fn contact(
        &self,
        user: Option<&str>,
        action: ContactAction,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let session = self.session(user)?;
        match action {
            ContactAction::Add { name, email } => {
                let contact = self.records.add_contact(&session, &name, &email)?;
                writeln!(out, "emergency contact saved: {} <{}>", contact.name, contact.email)?;
            },
            ContactAction::List => {
                let contacts = self.records.contacts(&session)?;
                if contacts.is_empty() {
                    writeln!(out, "no contacts added yet")?;
                }
                for contact in contacts {
                    writeln!(out, "{} <{}>", contact.name, contact.email)?;
                }
            },
        }
        Ok(())
    }

    fn mood(
        &self,
        user: Option<&str>,
        action: MoodAction,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let session = self.session(user)?;
        match action {
            MoodAction::Log { mood, score } => {
                // Each invocation is a new session: resume the window from
                // the persisted log.
                let mut tracker = MoodTracker::new();
                let history = self.records.moods(&session)?;
                for entry in history.iter().skip(history.len().saturating_sub(MOOD_WINDOW)) {
                    tracker.record(entry.mood);
                }

                let outcome = self.records.log_mood(&session, &mut tracker, mood, score)?;
                let suffix = if outcome.persisted { "" } else { " (demo, not saved)" };
                writeln!(out, "logged {mood} ({score:.2}){suffix}")?;

                if let Some(alert) = outcome.alert {
                    let moods: Vec<&str> = alert.moods.iter().map(|m| m.as_str()).collect();
                    writeln!(out, "low-mood streak: {}", moods.join(", "))?;
                    if alert.contacts.is_empty() {
                        writeln!(out, "no emergency contacts to alert")?;
                    }
                    for contact in &alert.contacts {
                        writeln!(out, "alert for {} <{}>", contact.name, contact.email)?;
                    }
                }
            },
            MoodAction::History => {
                let history = self.records.moods(&session)?;
                if history.is_empty() {
                    writeln!(out, "no mood data yet")?;
                }
                for entry in history {
                    writeln!(out, "{}  {} ({:.2})", entry.timestamp, entry.mood, entry.score)?;
                }
            },
            MoodAction::Summary => {
                let counts = self.records.mood_counts(&session)?;
                for mood in Mood::ALL {
                    if let Some(count) = counts.get(&mood) {
                        writeln!(out, "{mood}: {count}")?;
                    }
                }
            },
        }
        Ok(())
    }

    fn journal(
        &self,
        user: Option<&str>,
        action: JournalAction,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let session = self.session(user)?;
        match action {
            JournalAction::Add { entry, summary } => {
                let saved = self.records.add_journal_entry(&session, &entry, &summary)?;
                writeln!(out, "journal entry saved at {}", saved.timestamp)?;
            },
            JournalAction::List => {
                let entries = self.records.journal(&session)?;
                if entries.is_empty() {
                    writeln!(out, "no journal entries found")?;
                }
                for entry in entries {
                    writeln!(out, "{}", entry.timestamp)?;
                    writeln!(out, "{}", entry.entry.trim_end())?;
                    if !entry.summary.is_empty() {
                        writeln!(out, "  summary: {}", entry.summary)?;
                    }
                }
            },
        }
        Ok(())
    }

    fn chat(
        &self,
        user: Option<&str>,
        with: Option<&str>,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<(), CliError> {
        let session = self.session(user)?;
        if self.records.friends(&session)?.is_empty() {
            let notice = Notice::info("No friends added yet. Add one with `pairbox friend add`.");
            render_notices(&[ChatAction::Notice(notice)], out)?;
            return Ok(());
        }
        let mut chat = ChatRuntime::new(&self.mailbox, session.clone());

        if let Some(email) = with {
            let actions = self.open_or_notice(&session, &mut chat, email);
            render(&chat, &actions, out)?;
        } else {
            writeln!(out, "{HELP}")?;
        }

        let mut line = String::new();
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }

            let actions = match commands::parse(&line) {
                commands::Command::Quit => break,
                commands::Command::Help => {
                    writeln!(out, "{HELP}")?;
                    continue;
                },
                commands::Command::Friends => {
                    for friend in self.records.friends(&session)? {
                        writeln!(out, "{}", friend.email)?;
                    }
                    continue;
                },
                commands::Command::Open { email } => {
                    self.open_or_notice(&session, &mut chat, &email)
                },
                commands::Command::Refresh => chat.dispatch(ChatEvent::Refresh),
                commands::Command::Message { content } => {
                    chat.dispatch(ChatEvent::Submit { text: content })
                },
                commands::Command::Unknown { input } => {
                    vec![ChatAction::Notice(Notice::warning(format!("unknown command: {input}")))]
                },
                commands::Command::InvalidArgs { command, error } => {
                    vec![ChatAction::Notice(Notice::warning(format!("{command}: {error}")))]
                },
            };
            render(&chat, &actions, out)?;
        }

        debug!("chat loop finished");
        Ok(())
    }

    fn open_or_notice(
        &self,
        session: &Session,
        chat: &mut ChatRuntime<'_, Arc<S>, E>,
        email: &str,
    ) -> Vec<ChatAction> {
        match self.open_conversation(session, chat, email) {
            Ok(actions) => actions,
            Err(error) => vec![ChatAction::Notice(Notice::error(error.to_string()))],
        }
    }
}

/// Print notices, then the transcript once if anything asked for a render.
fn render<S: DocumentStore, E: Environment>(
    chat: &ChatRuntime<'_, S, E>,
    actions: &[ChatAction],
    out: &mut impl Write,
) -> std::io::Result<()> {
    render_notices(actions, out)?;

    if actions.iter().any(|a| matches!(a, ChatAction::Render)) {
        let lines = chat.chat().lines();
        if lines.is_empty() {
            writeln!(out, "(no messages)")?;
        }
        for line in lines {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn render_notices(actions: &[ChatAction], out: &mut impl Write) -> std::io::Result<()> {
    for action in actions {
        if let ChatAction::Notice(notice) = action {
            let prefix = match notice.level {
                NoticeLevel::Info => "",
                NoticeLevel::Warning => "warning: ",
                NoticeLevel::Error => "error: ",
            };
            writeln!(out, "{prefix}{notice}")?;
        }
    }
    Ok(())
}
