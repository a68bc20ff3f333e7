//! Mood log and low-mood streak detection.
//!
//! Every logged mood goes into the session's [`MoodTracker`], a window of the
//! last [`MOOD_WINDOW`] moods. When the newest [`LOW_MOOD_STREAK`] moods are
//! all low, the outcome carries a [`StreakAlert`] addressed to the user's
//! emergency contacts. Delivering the alert is the caller's job.

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{EmergencyContact, UserRecords};
use crate::{
    env::{Environment, iso_timestamp},
    error::DirectoryError,
    participant::Session,
    store::{DocumentStore, from_document, to_document},
};

/// Root of all mood logs.
pub const MOODS_ROOT: &str = "moods";

/// Moods remembered per session.
pub const MOOD_WINDOW: usize = 10;

/// Consecutive low moods that trigger an alert.
pub const LOW_MOOD_STREAK: usize = 4;

/// Mood categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Happy.
    Happy,
    /// Sad (low).
    Sad,
    /// Angry (low).
    Angry,
    /// Anxious (low).
    Anxious,
    /// Calm.
    Calm,
    /// Neutral; also the fallback for unrecognised labels.
    Neutral,
    /// Excited.
    Excited,
    /// Bored (low).
    Bored,
    /// Frustrated (low).
    Frustrated,
}

impl Mood {
    /// Every category.
    pub const ALL: [Mood; 9] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Anxious,
        Mood::Calm,
        Mood::Neutral,
        Mood::Excited,
        Mood::Bored,
        Mood::Frustrated,
    ];

    /// Lowercase label, as stored.
    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Anxious => "anxious",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
            Mood::Excited => "excited",
            Mood::Bored => "bored",
            Mood::Frustrated => "frustrated",
        }
    }

    /// Sad, anxious, frustrated, angry, and bored count towards a streak.
    pub fn is_low(self) -> bool {
        matches!(self, Mood::Sad | Mood::Anxious | Mood::Frustrated | Mood::Angry | Mood::Bored)
    }

    /// Parse a classifier label, falling back to neutral for anything
    /// unrecognised.
    pub fn from_label_lossy(label: &str) -> Self {
        label.parse().unwrap_or(Mood::Neutral)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == label)
            .ok_or_else(|| DirectoryError::UnknownMood(s.to_string()))
    }
}

/// One persisted mood log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Category.
    pub mood: Mood,
    /// Classifier confidence in `0.0..=1.0`.
    pub score: f64,
    /// ISO-8601 time of logging.
    pub timestamp: String,
}

/// Recent moods of one session.
#[derive(Debug, Clone, Default)]
pub struct MoodTracker {
    recent: VecDeque<Mood>,
}

impl MoodTracker {
    /// Tracker with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `mood`, dropping the oldest beyond [`MOOD_WINDOW`].
    ///
    /// Returns the streak if the newest [`LOW_MOOD_STREAK`] moods are all
    /// low.
    pub fn record(&mut self, mood: Mood) -> Option<Vec<Mood>> {
        self.recent.push_back(mood);
        while self.recent.len() > MOOD_WINDOW {
            self.recent.pop_front();
        }
        self.low_streak()
    }

    /// The newest [`LOW_MOOD_STREAK`] moods, if they are all low.
    pub fn low_streak(&self) -> Option<Vec<Mood>> {
        let start = self.recent.len().checked_sub(LOW_MOOD_STREAK)?;
        let tail: Vec<Mood> = self.recent.iter().skip(start).copied().collect();
        tail.iter().all(|mood| mood.is_low()).then_some(tail)
    }

    /// Remembered moods, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = Mood> + '_ {
        self.recent.iter().copied()
    }
}

/// Request to notify emergency contacts about a low-mood streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakAlert {
    /// Email of the user the alert is about.
    pub user_email: String,
    /// The low moods, oldest first.
    pub moods: Vec<Mood>,
    /// Who to notify. Empty if the user has no contacts.
    pub contacts: Vec<EmergencyContact>,
}

/// Result of logging a mood.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodOutcome {
    /// The logged entry.
    pub entry: MoodEntry,
    /// False for demo sessions.
    pub persisted: bool,
    /// Present when this mood completed a low-mood streak.
    pub alert: Option<StreakAlert>,
}

impl<S: DocumentStore, E: Environment> UserRecords<S, E> {
    /// Log a mood for the session user.
    ///
    /// The entry is persisted unless the session is a demo; the tracker is
    /// updated either way. Every store call happens before the write, so an
    /// error means nothing was saved and `tracker` is unchanged.
    ///
    /// # Errors
    ///
    /// - `InvalidScore` if `score` is not a finite value in `0.0..=1.0`
    /// - `Store` if the contacts could not be read or the entry written
    #[instrument(level = "debug", skip_all, fields(user = %session.user(), %mood))]
    pub fn log_mood(
        &self,
        session: &Session,
        tracker: &mut MoodTracker,
        mood: Mood,
        score: f64,
    ) -> Result<MoodOutcome, DirectoryError> {
        if !(0.0..=1.0).contains(&score) {
            return Err(DirectoryError::InvalidScore(score));
        }

        let entry = MoodEntry { mood, score, timestamp: iso_timestamp(self.env.now()) };

        let mut next = tracker.clone();
        let alert = match next.record(mood) {
            Some(moods) => {
                let contacts = self.contacts(session)?;
                info!(contacts = contacts.len(), "low-mood streak detected");
                Some(StreakAlert { user_email: session.email().to_string(), moods, contacts })
            },
            None => None,
        };

        let persisted = !session.is_demo();
        if persisted {
            let path = Self::list_path(MOODS_ROOT, session.user())?;
            let key = self.store.push(&path, to_document(&entry)?)?;
            debug!(%key, "mood persisted");
        }

        *tracker = next;
        Ok(MoodOutcome { entry, persisted, alert })
    }

    /// The session user's mood log, oldest first.
    pub fn moods(&self, session: &Session) -> Result<Vec<MoodEntry>, DirectoryError> {
        let path = Self::list_path(MOODS_ROOT, session.user())?;
        let entries = self.store.read_ordered_by(&path, "timestamp")?;

        Ok(entries
            .into_iter()
            .filter_map(|(key, document)| match from_document::<MoodEntry>(&document) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    warn!(%path, %key, %error, "skipping undecodable mood entry");
                    None
                },
            })
            .collect())
    }

    /// How often each mood appears in the session user's log.
    pub fn mood_counts(&self, session: &Session) -> Result<BTreeMap<Mood, usize>, DirectoryError> {
        let mut counts = BTreeMap::new();
        for entry in self.moods(session)? {
            *counts.entry(entry.mood).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
