//! Line commands for the interactive chat loop.
//!
//! A line starting with `/` is a command; every other line is a message for
//! the open conversation.

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Switch to the conversation with a friend.
    Open {
        /// Friend's email.
        email: String,
    },

    /// Reload the current conversation.
    Refresh,

    /// List friends.
    Friends,

    /// Show available commands.
    Help,

    /// Leave the chat loop.
    Quit,

    /// Text for the open conversation. May be blank.
    Message {
        /// Trimmed line.
        content: String,
    },

    /// A `/word` that is not a command.
    Unknown {
        /// The line as typed.
        input: String,
    },

    /// A known command with bad arguments.
    InvalidArgs {
        /// Command name as typed.
        command: String,
        /// What is wrong.
        error: String,
    },
}

/// Help text listing every command.
pub const HELP: &str = "\
/open <email>  chat with a friend
/refresh       reload the conversation
/friends       list friends
/help          show this help
/quit          leave
anything else is sent as a message";

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let Some(body) = line.strip_prefix('/') else {
        return Command::Message { content: line.to_string() };
    };

    let (name, args) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
    let args = args.trim();

    let command = match name {
        "open" | "o" => return parse_open(args),
        "refresh" | "r" => Command::Refresh,
        "friends" | "f" => Command::Friends,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => return Command::Unknown { input: line.to_string() },
    };

    if args.is_empty() {
        command
    } else {
        Command::InvalidArgs { command: name.to_string(), error: "takes no arguments".into() }
    }
}

fn parse_open(args: &str) -> Command {
    let invalid = |error: &str| Command::InvalidArgs { command: "open".into(), error: error.into() };

    let mut words = args.split_whitespace();
    match (words.next(), words.next()) {
        (None, _) => invalid("usage: /open <email>"),
        (Some(_), Some(_)) => invalid("expected a single email"),
        (Some(email), None) if !email.contains('@') => invalid("not an email address"),
        (Some(email), None) => Command::Open { email: email.to_string() },
    }
}
