//! Environment abstraction for time and randomness.
//!
//! Production code uses [`SystemEnv`]. Simulation supplies a seeded RNG and a
//! manually advanced clock so that push keys, nonces, and timestamps are
//! reproducible.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::RngCore;

/// Source of wall-clock time and random bytes.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Fill `buffer` with cryptographically secure random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);
}

/// Real clock and thread-local CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::thread_rng().fill_bytes(buffer);
    }
}

/// ISO-8601 form used for every stored timestamp.
///
/// UTC with a fixed six-digit fraction, so lexical order matches
/// chronological order.
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
