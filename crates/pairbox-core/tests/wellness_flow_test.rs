//! Wellness records through the public API.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, TimeZone, Utc};
use pairbox_core::{
    DirectoryError, Environment, MemoryStore, Mood, MoodTracker, ParticipantId, Session,
    UserRecords, wellness::MOOD_WINDOW,
};

#[derive(Clone, Default)]
struct TickEnv {
    ticks: Arc<AtomicI64>,
}

impl Environment for TickEnv {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap() + chrono::Duration::seconds(tick)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        buffer.fill(0x2A);
    }
}

fn records() -> UserRecords<MemoryStore<TickEnv>, TickEnv> {
    let env = TickEnv::default();
    UserRecords::new(MemoryStore::new(env.clone()), env)
}

fn session(name: &str) -> Session {
    Session::new(ParticipantId::new(name).unwrap(), format!("{name}@example.com"))
}

#[test]
fn streak_alert_reaches_every_contact() {
    let records = records();
    let user = session("dana");
    records.add_contact(&user, "Sam", "sam@example.com").unwrap();
    records.add_contact(&user, "Lee", "lee@example.com").unwrap();

    let mut tracker = MoodTracker::new();
    let labels = ["happy", "sad", "bored", "angry", "anxious"];
    let mut alerts = Vec::new();
    for label in labels {
        let mood: Mood = label.parse().unwrap();
        let outcome = records.log_mood(&user, &mut tracker, mood, 0.7).unwrap();
        alerts.push(outcome.alert);
    }

    assert!(alerts[..4].iter().all(Option::is_none));
    let alert = alerts[4].as_ref().unwrap();
    assert_eq!(alert.moods, [Mood::Sad, Mood::Bored, Mood::Angry, Mood::Anxious]);
    let emails: Vec<&str> = alert.contacts.iter().map(|c| c.email.as_str()).collect();
    assert_eq!(emails, ["sam@example.com", "lee@example.com"]);
}

#[test]
fn history_outlives_session_window() {
    let records = records();
    let user = session("dana");
    let mut tracker = MoodTracker::new();

    for _ in 0..(MOOD_WINDOW + 5) {
        records.log_mood(&user, &mut tracker, Mood::Calm, 0.5).unwrap();
    }

    assert_eq!(tracker.recent().count(), MOOD_WINDOW);
    assert_eq!(records.moods(&user).unwrap().len(), MOOD_WINDOW + 5);
    assert_eq!(records.mood_counts(&user).unwrap().get(&Mood::Calm), Some(&(MOOD_WINDOW + 5)));
}

#[test]
fn records_are_per_user() {
    let records = records();
    let dana = session("dana");
    let eli = session("eli");

    records.add_journal_entry(&dana, "Dana's day", "").unwrap();
    records.add_contact(&eli, "Sam", "sam@example.com").unwrap();

    assert_eq!(records.journal(&dana).unwrap().len(), 1);
    assert!(records.journal(&eli).unwrap().is_empty());
    assert!(records.contacts(&dana).unwrap().is_empty());

    // Duplicate checks are scoped to the owner too.
    records.add_contact(&dana, "Sam", "sam@example.com").unwrap();
    assert!(matches!(
        records.add_contact(&dana, "Sam", "sam@example.com"),
        Err(DirectoryError::DuplicateContact { .. })
    ));
}
