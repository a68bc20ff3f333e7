//! Command-line arguments.

use std::{num::NonZeroUsize, path::PathBuf};

use clap::{Parser, Subcommand};
use pairbox_core::{MailboxConfig, Mood};

/// Pairwise encrypted mailboxes and wellness records.
#[derive(Debug, Parser)]
#[command(name = "pairbox", version, about, long_about = None)]
pub struct Args {
    /// Database file
    #[arg(long, default_value = "pairbox.redb")]
    pub db: PathBuf,

    /// Act as the account registered under this email
    #[arg(long = "as", value_name = "EMAIL", global = true)]
    pub user: Option<String>,

    /// Demo session: moods are tracked but not saved
    #[arg(long, global = true)]
    pub demo: bool,

    /// Messages kept per mailbox
    #[arg(long, default_value = "10")]
    pub retention: NonZeroUsize,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Settings derived from the arguments.
    pub fn config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db.clone(),
            mailbox: MailboxConfig { retention: self.retention },
            demo: self.demo,
        }
    }
}

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Database file.
    pub db_path: PathBuf,
    /// Mailbox settings.
    pub mailbox: MailboxConfig,
    /// Whether sessions are demo sessions.
    pub demo: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("pairbox.redb"),
            mailbox: MailboxConfig::default(),
            demo: false,
        }
    }
}

/// Top-level subcommands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Create an account
    Register {
        /// Account email
        email: String,
    },

    /// List registered accounts
    Accounts,

    /// Send an encrypted message
    Send {
        /// Receiver's email
        #[arg(long)]
        to: String,
        /// Message text
        text: String,
    },

    /// Show a conversation
    Read {
        /// Counterpart's email
        #[arg(long)]
        with: String,
    },

    /// Manage friends
    Friend {
        /// Friends action
        #[command(subcommand)]
        action: FriendAction,
    },

    /// Manage emergency contacts
    Contact {
        /// Contacts action
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Log and review moods
    Mood {
        /// Mood action
        #[command(subcommand)]
        action: MoodAction,
    },

    /// Write and review journal entries
    Journal {
        /// Journal action
        #[command(subcommand)]
        action: JournalAction,
    },

    /// Interactive chat, reading commands from stdin
    Chat {
        /// Open this friend's conversation first
        #[arg(long)]
        with: Option<String>,
    },
}

/// `friend` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum FriendAction {
    /// Add a friend by email
    Add {
        /// Friend's account email
        email: String,
    },
    /// List friends
    List,
}

/// `contact` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ContactAction {
    /// Save an emergency contact
    Add {
        /// Contact name
        name: String,
        /// Contact email
        email: String,
    },
    /// List emergency contacts
    List,
}

/// `mood` subcommands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum MoodAction {
    /// Log a mood
    Log {
        /// happy, sad, angry, anxious, calm, neutral, excited, bored, frustrated
        mood: Mood,
        /// Confidence in 0..=1
        #[arg(long, default_value_t = 1.0)]
        score: f64,
    },
    /// Show the mood log
    History,
    /// Count moods by category
    Summary,
}

/// `journal` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum JournalAction {
    /// Write an entry
    Add {
        /// Entry text
        entry: String,
        /// Summary stored with the entry
        #[arg(long, default_value = "")]
        summary: String,
    },
    /// List entries
    List,
}
