//! End-to-end chat flow: two users, friends list, runtime-driven messaging.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, TimeZone, Utc};
use pairbox_core::{
    ChatAction, ChatEvent, ChatRuntime, Environment, MailboxConfig, MemoryIdentities, MemoryStore,
    NoticeLevel, ParticipantId, SecureMailbox, Session, UserRecords,
};

/// Clock that advances one millisecond per reading.
#[derive(Clone, Default)]
struct TickEnv {
    ticks: Arc<AtomicI64>,
}

impl Environment for TickEnv {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap() + chrono::Duration::milliseconds(tick)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        let tick = self.ticks.load(Ordering::SeqCst) as u8;
        buffer.fill(tick);
    }
}

fn id(name: &str) -> ParticipantId {
    ParticipantId::new(name).unwrap()
}

fn session(name: &str) -> Session {
    Session::new(id(name), format!("{name}@example.com"))
}

#[test]
fn friends_exchange_messages() {
    let env = TickEnv::default();
    let store = Arc::new(MemoryStore::new(env.clone()));
    let records = UserRecords::new(Arc::clone(&store), env.clone());
    let mailbox = SecureMailbox::new(Arc::clone(&store), env, MailboxConfig::default());

    let directory = MemoryIdentities::new();
    directory.register("alice@example.com", id("alice")).unwrap();
    directory.register("bob@example.com", id("bob")).unwrap();

    let alice = session("alice");
    let bob = session("bob");
    records.add_friend(&alice, &directory, "bob@example.com").unwrap();
    records.add_friend(&bob, &directory, "alice@example.com").unwrap();

    let friend = records.friends(&alice).unwrap().remove(0);
    let mut alice_chat = ChatRuntime::new(&mailbox, alice);
    let actions = alice_chat.dispatch(ChatEvent::SelectFriend {
        friend: friend.participant().unwrap(),
        label: friend.email.clone(),
    });
    assert_eq!(actions, vec![ChatAction::Render, ChatAction::Render]);
    assert!(alice_chat.chat().lines().is_empty());

    let actions = alice_chat.dispatch(ChatEvent::Submit { text: "hi bob ".into() });
    assert_eq!(actions, vec![ChatAction::Render]);

    let mut bob_chat = ChatRuntime::new(&mailbox, bob);
    bob_chat.dispatch(ChatEvent::SelectFriend {
        friend: id("alice"),
        label: "alice@example.com".into(),
    });
    bob_chat.dispatch(ChatEvent::Submit { text: "hey alice".into() });

    alice_chat.dispatch(ChatEvent::Refresh);
    let alice_view: Vec<String> =
        alice_chat.chat().lines().iter().map(ToString::to_string).collect();
    assert_eq!(alice_view, ["You: hi bob", "bob@example.com: hey alice"]);

    let bob_view: Vec<String> = bob_chat.chat().lines().iter().map(ToString::to_string).collect();
    assert_eq!(bob_view, ["alice@example.com: hi bob", "You: hey alice"]);
}

#[test]
fn blank_submit_never_reaches_store() {
    let env = TickEnv::default();
    let store = Arc::new(MemoryStore::new(env.clone()));
    let mailbox = SecureMailbox::new(Arc::clone(&store), env, MailboxConfig::default());

    let mut chat = ChatRuntime::new(&mailbox, session("alice"));
    chat.dispatch(ChatEvent::SelectFriend { friend: id("bob"), label: "bob".into() });

    let actions = chat.dispatch(ChatEvent::Submit { text: "   ".into() });
    assert!(matches!(&actions[..], [ChatAction::Notice(n)] if n.level == NoticeLevel::Warning));
    assert!(store.is_empty());
}

#[test]
fn chatting_with_self_is_rejected() {
    let env = TickEnv::default();
    let mailbox = SecureMailbox::new(MemoryStore::new(env.clone()), env, MailboxConfig::default());

    let mut chat = ChatRuntime::new(&mailbox, session("alice"));
    let actions =
        chat.dispatch(ChatEvent::SelectFriend { friend: id("alice"), label: "me".into() });

    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0], ChatAction::Render);
    assert!(matches!(&actions[1], ChatAction::Notice(n) if n.level == NoticeLevel::Warning));
}
