//! Simulated environment.
//!
//! Time only moves when a test calls [`SimEnv::advance`], and randomness comes
//! from a seeded ChaCha RNG. Clones share the same clock and RNG, so a store
//! and a mailbox service built from one `SimEnv` see a single timeline.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use pairbox_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Start of simulated time: 2025-01-01T00:00:00Z.
const EPOCH_SECS: i64 = 1_735_689_600;

/// Deterministic environment for simulation.
#[derive(Clone)]
pub struct SimEnv {
    state: Arc<Mutex<SimState>>,
}

struct SimState {
    now: DateTime<Utc>,
    rng: ChaCha8Rng,
}

impl SimEnv {
    /// Environment with the given RNG seed, clock at the simulation epoch.
    pub fn with_seed(seed: u64) -> Self {
        let now = Utc.timestamp_opt(EPOCH_SECS, 0).single().unwrap_or_default();
        Self { state: Arc::new(Mutex::new(SimState { now, rng: ChaCha8Rng::seed_from_u64(seed) })) }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.lock();
        let step = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        state.now += step;
    }

    /// Set the clock, which may move it backwards.
    pub fn set_time(&self, now: DateTime<Utc>) {
        self.lock().now = now;
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl Environment for SimEnv {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.lock().rng.fill_bytes(buffer);
    }
}
