//! End-to-end tests of CLI commands over a redb file.

use std::{io::Cursor, path::Path};

use clap::Parser;
use pairbox_cli::{Args, CliConfig, CliError, Pairbox, RedbStore};
use pairbox_core::{
    DirectoryError, DocumentStore, MailboxPath, ParticipantId, SystemEnv, store::field,
};
use pairbox_crypto::SealedMessage;
use tempfile::TempDir;

type App = Pairbox<RedbStore<SystemEnv>, SystemEnv>;

fn open(path: &Path, config: &CliConfig) -> App {
    Pairbox::new(RedbStore::open(path, SystemEnv).unwrap(), SystemEnv, config)
}

/// Parse `argv` like the binary does and run it with `input` as stdin.
fn run_with_input(app: &App, argv: &[&str], input: &str) -> Result<String, CliError> {
    let args = Args::try_parse_from(std::iter::once("pairbox").chain(argv.iter().copied()))
        .unwrap();
    let mut out = Vec::new();
    app.execute(args.user.as_deref(), args.command, &mut Cursor::new(input), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn run(app: &App, argv: &[&str]) -> String {
    run_with_input(app, argv, "").unwrap()
}

fn register(app: &App, email: &str) -> ParticipantId {
    run(app, &["register", email]);
    app.identities().require(email).unwrap()
}

/// Add `a` and `b` to each other's friends lists.
fn befriend(app: &App, a: &str, b: &str) {
    run(app, &["friend", "add", b, "--as", a]);
    run(app, &["friend", "add", a, "--as", b]);
}

#[test]
fn send_and_read_between_friends() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());

    register(&app, "alice@example.com");
    register(&app, "bob@example.com");

    let added = run(&app, &["friend", "add", "bob@example.com", "--as", "alice@example.com"]);
    assert_eq!(added, "bob@example.com added as a friend\n");
    assert_eq!(run(&app, &["friend", "list", "--as", "alice@example.com"]), "bob@example.com\n");
    run(&app, &["friend", "add", "alice@example.com", "--as", "bob@example.com"]);

    run(&app, &["send", "--to", "bob@example.com", "hi bob", "--as", "alice@example.com"]);
    run(&app, &["send", "--to", "alice@example.com", "hi alice", "--as", "bob@example.com"]);

    let alice_view = run(&app, &["read", "--with", "bob@example.com", "--as", "alice@example.com"]);
    assert_eq!(alice_view, "You: hi bob\nbob@example.com: hi alice\n");

    let bob_view = run(&app, &["read", "--with", "alice@example.com", "--as", "bob@example.com"]);
    assert_eq!(bob_view, "alice@example.com: hi bob\nYou: hi alice\n");
}

#[test]
fn commands_need_a_known_user() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");

    assert!(matches!(run_with_input(&app, &["friend", "list"], ""), Err(CliError::MissingUser)));
    assert!(matches!(
        run_with_input(&app, &["friend", "list", "--as", "carol@example.com"], ""),
        Err(CliError::UnknownUser { .. })
    ));
    assert!(matches!(
        run_with_input(&app, &["register", "ALICE@example.com"], ""),
        Err(CliError::AlreadyRegistered { .. })
    ));
}

#[test]
fn messages_persist_sealed_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pairbox.redb");

    let (alice, bob) = {
        let app = open(&path, &CliConfig::default());
        let alice = register(&app, "alice@example.com");
        let bob = register(&app, "bob@example.com");
        befriend(&app, "alice@example.com", "bob@example.com");
        run(&app, &["send", "--to", "bob@example.com", "still here", "--as", "alice@example.com"]);
        (alice, bob)
    };

    let app = open(&path, &CliConfig::default());
    let view = run(&app, &["read", "--with", "alice@example.com", "--as", "bob@example.com"]);
    assert_eq!(view, "alice@example.com: still here\n");
    drop(app);

    let store = RedbStore::open(&path, SystemEnv).unwrap();
    for mailbox in [MailboxPath::new(alice.clone(), bob.clone()), MailboxPath::new(bob, alice)] {
        let records = store.read(&mailbox.store_path().unwrap()).unwrap();
        assert_eq!(records.len(), 1);

        let text = field(&records[0].1, "text").unwrap().as_text().unwrap();
        assert!(!text.contains("still here"));
        assert!(SealedMessage::parse(text).is_ok());
    }
}

#[test]
fn retention_flag_limits_mailboxes() {
    let dir = TempDir::new().unwrap();
    let args = Args::try_parse_from(["pairbox", "--retention", "3", "accounts"]).unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &args.config());

    register(&app, "alice@example.com");
    register(&app, "bob@example.com");
    befriend(&app, "alice@example.com", "bob@example.com");
    for i in 0..5 {
        let text = format!("message {i}");
        run(&app, &["send", "--to", "bob@example.com", &text, "--as", "alice@example.com"]);
    }

    let view = run(&app, &["read", "--with", "alice@example.com", "--as", "bob@example.com"]);
    assert_eq!(
        view,
        "alice@example.com: message 2\nalice@example.com: message 3\nalice@example.com: message 4\n"
    );
}

#[test]
fn chat_loop_runs_a_script() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");
    register(&app, "bob@example.com");
    befriend(&app, "alice@example.com", "bob@example.com");

    let script = "hello?\n/open bob@example.com\nhey bob\n   \n/bogus\n/quit\nnever sent\n";
    let output =
        run_with_input(&app, &["chat", "--as", "alice@example.com"], script).unwrap();

    insta::assert_snapshot!(output, @r"
    /open <email>  chat with a friend
    /refresh       reload the conversation
    /friends       list friends
    /help          show this help
    /quit          leave
    anything else is sent as a message
    warning: Select a friend to chat
    (no messages)
    You: hey bob
    warning: Please enter a message.
    warning: unknown command: /bogus
    ");

    let view = run(&app, &["read", "--with", "alice@example.com", "--as", "bob@example.com"]);
    assert_eq!(view, "alice@example.com: hey bob\n");
}

#[test]
fn messages_need_a_friendship() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    let alice = register(&app, "alice@example.com");
    let mallory = register(&app, "mallory@example.com");

    let sent = run_with_input(
        &app,
        &["send", "--to", "alice@example.com", "spam", "--as", "mallory@example.com"],
        "",
    );
    assert!(matches!(
        sent,
        Err(CliError::Directory(DirectoryError::NotAFriend { email })) if email == "alice@example.com"
    ));
    assert!(matches!(
        run_with_input(&app, &["read", "--with", "mallory@example.com", "--as", "alice@example.com"], ""),
        Err(CliError::Directory(DirectoryError::NotAFriend { .. }))
    ));
    drop(app);

    // Nothing reached either mailbox.
    let store = RedbStore::open(dir.path().join("pairbox.redb"), SystemEnv).unwrap();
    for mailbox in [MailboxPath::new(alice.clone(), mallory.clone()), MailboxPath::new(mallory, alice)] {
        assert!(store.read(&mailbox.store_path().unwrap()).unwrap().is_empty());
    }
}

#[test]
fn one_sided_friendship_still_blocks_the_other_side() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");
    register(&app, "bob@example.com");
    run(&app, &["friend", "add", "bob@example.com", "--as", "alice@example.com"]);

    run(&app, &["send", "--to", "bob@example.com", "hi", "--as", "alice@example.com"]);
    assert!(matches!(
        run_with_input(&app, &["send", "--to", "alice@example.com", "hi", "--as", "bob@example.com"], ""),
        Err(CliError::Directory(DirectoryError::NotAFriend { .. }))
    ));
}

#[test]
fn chat_without_friends_is_blocked() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");

    let output = run_with_input(
        &app,
        &["chat", "--with", "alice@example.com", "--as", "alice@example.com"],
        "hi me\n",
    )
    .unwrap();

    assert_eq!(output, "No friends added yet. Add one with `pairbox friend add`.\n");
}

#[test]
fn chat_open_rejects_strangers() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");
    register(&app, "bob@example.com");
    register(&app, "mallory@example.com");
    befriend(&app, "alice@example.com", "bob@example.com");

    let output = run_with_input(
        &app,
        &["chat", "--with", "mallory@example.com", "--as", "alice@example.com"],
        "psst\n",
    )
    .unwrap();

    assert!(output.contains("error: mallory@example.com is not on your friends list"));
    assert!(output.contains("warning: Select a friend to chat"));
    assert!(!output.contains("You: psst"));
}

#[test]
fn low_mood_streak_alerts_contacts() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");

    run(&app, &["contact", "add", "Carol", "carol@example.com", "--as", "alice@example.com"]);

    for mood in ["sad", "angry", "bored"] {
        let output = run(&app, &["mood", "log", mood, "--score", "0.5", "--as", "alice@example.com"]);
        assert!(!output.contains("streak"));
    }
    let output = run(&app, &["mood", "log", "anxious", "--as", "alice@example.com"]);
    assert_eq!(
        output,
        "logged anxious (1.00)\n\
         low-mood streak: sad, angry, bored, anxious\n\
         alert for Carol <carol@example.com>\n"
    );

    let summary = run(&app, &["mood", "summary", "--as", "alice@example.com"]);
    assert_eq!(summary, "sad: 1\nangry: 1\nanxious: 1\nbored: 1\n");
}

#[test]
fn demo_moods_are_not_saved() {
    let dir = TempDir::new().unwrap();
    let args = Args::try_parse_from(["pairbox", "--demo", "accounts"]).unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &args.config());
    register(&app, "alice@example.com");

    let output = run(&app, &["mood", "log", "happy", "--as", "alice@example.com"]);
    assert_eq!(output, "logged happy (1.00) (demo, not saved)\n");
    assert_eq!(run(&app, &["mood", "history", "--as", "alice@example.com"]), "no mood data yet\n");
}

#[test]
fn journal_entries_are_listed() {
    let dir = TempDir::new().unwrap();
    let app = open(&dir.path().join("pairbox.redb"), &CliConfig::default());
    register(&app, "alice@example.com");

    assert_eq!(
        run(&app, &["journal", "list", "--as", "alice@example.com"]),
        "no journal entries found\n"
    );
    run(&app, &[
        "journal",
        "add",
        "Long day at work.",
        "--summary",
        "tired",
        "--as",
        "alice@example.com",
    ]);

    let listing = run(&app, &["journal", "list", "--as", "alice@example.com"]);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "Long day at work.");
    assert_eq!(lines[2], "  summary: tired");
}
