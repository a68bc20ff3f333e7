//! Deterministic simulation harness for Pairbox testing.
//!
//! Seeded implementations of the [`Environment`](pairbox_core::Environment)
//! trait, a fault-injecting document store, and a reference model of the
//! secure mailbox for model-based tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty_store;
pub mod model;
pub mod sim_env;

pub use faulty_store::{FaultyStore, StoreCall};
pub use model::{
    ModelWorld, Operation, OperationError, OperationResult, ParticipantIndex, RealWorld,
    SmallMessage,
};
pub use sim_env::SimEnv;
