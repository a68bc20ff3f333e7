//! Time-prefixed, lexicographically increasing record keys.
//!
//! A push key is 20 characters over an ASCII-ordered 64-symbol alphabet:
//!
//! ```text
//! ┌───────────────────────┬──────────────────────────┐
//! │ 8 chars: millis (BE)  │ 12 chars: random suffix  │
//! └───────────────────────┴──────────────────────────┘
//! ```
//!
//! Keys minted in the same millisecond reuse the previous suffix plus one, so
//! one generator always produces strictly increasing keys. A clock that steps
//! backwards is clamped to the last timestamp seen, and an exhausted suffix
//! rolls over into the next millisecond.

use super::RecordKey;

/// Alphabet in ASCII order, so string order equals numeric order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Length of every push key.
pub const PUSH_KEY_LEN: usize = TIME_CHARS + RANDOM_CHARS;

/// Mints push keys.
#[derive(Debug, Clone, Default)]
pub struct PushKeyGenerator {
    last_millis: i64,
    last_random: [u8; RANDOM_CHARS],
}

impl PushKeyGenerator {
    /// New generator with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next key.
    ///
    /// `fill_random` is only called when the millisecond changed.
    pub fn next_key(&mut self, now_millis: i64, fill_random: impl FnOnce(&mut [u8])) -> RecordKey {
        let mut millis = now_millis.max(self.last_millis).max(0);
        let duplicate = millis == self.last_millis;

        if duplicate {
            if self.increment_suffix() {
                // Suffix space exhausted: borrow the next millisecond.
                millis += 1;
            }
        } else {
            let mut random = [0u8; RANDOM_CHARS];
            fill_random(&mut random);
            for (slot, byte) in self.last_random.iter_mut().zip(random) {
                *slot = byte & 0x3F;
            }
        }
        self.last_millis = millis;

        let mut key = [0u8; PUSH_KEY_LEN];
        let mut remaining = millis;
        for slot in key[..TIME_CHARS].iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }
        for (slot, index) in key[TIME_CHARS..].iter_mut().zip(self.last_random) {
            *slot = PUSH_CHARS[index as usize];
        }

        RecordKey::new(key.iter().map(|&b| char::from(b)).collect::<String>())
    }

    /// Add one to the suffix. Returns true when it wrapped around to zero.
    fn increment_suffix(&mut self) -> bool {
        for digit in self.last_random.iter_mut().rev() {
            if *digit < 63 {
                *digit += 1;
                return false;
            }
            *digit = 0;
        }
        true
    }
}
