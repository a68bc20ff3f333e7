//! Fault-injecting document store.
//!
//! Wraps any [`DocumentStore`] and fails selected calls with
//! [`StoreError::Unavailable`]. Calls are numbered per kind from 1 in the
//! order they reach the store, so a test can fail exactly the receiver's
//! write of a delivery.

use std::{
    collections::BTreeSet,
    sync::{Mutex, MutexGuard, PoisonError},
};

use pairbox_core::{Document, DocumentStore, RecordKey, StoreError, StorePath};
use tracing::debug;

/// Kind of store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreCall {
    /// `push`
    Push,
    /// `read` (and `read_ordered_by`)
    Read,
    /// `delete`
    Delete,
}

#[derive(Default)]
struct FaultPlan {
    counts: [usize; 3],
    scheduled: BTreeSet<(StoreCall, usize)>,
    always: BTreeSet<StoreCall>,
}

impl FaultPlan {
    fn index(call: StoreCall) -> usize {
        match call {
            StoreCall::Push => 0,
            StoreCall::Read => 1,
            StoreCall::Delete => 2,
        }
    }

    /// Count the call and decide whether it fails.
    fn admit(&mut self, call: StoreCall) -> bool {
        let count = &mut self.counts[Self::index(call)];
        *count += 1;
        let number = *count;
        self.always.contains(&call) || self.scheduled.remove(&(call, number))
    }
}

/// Document store that fails on demand.
pub struct FaultyStore<S> {
    inner: S,
    plan: Mutex<FaultPlan>,
}

impl<S: DocumentStore> FaultyStore<S> {
    /// Wrap `inner` with no faults scheduled.
    pub fn new(inner: S) -> Self {
        Self { inner, plan: Mutex::new(FaultPlan::default()) }
    }

    /// Fail the `number`th call of `call` kind, counting from 1 since
    /// creation.
    pub fn fail_nth(&self, call: StoreCall, number: usize) {
        self.plan().scheduled.insert((call, number));
    }

    /// Fail every call of `call` kind until [`FaultyStore::heal`].
    pub fn fail_all(&self, call: StoreCall) {
        self.plan().always.insert(call);
    }

    /// Drop all scheduled and permanent faults.
    pub fn heal(&self) {
        let mut plan = self.plan();
        plan.scheduled.clear();
        plan.always.clear();
    }

    /// Number of calls of `call` kind seen so far, failed ones included.
    pub fn calls(&self, call: StoreCall) -> usize {
        self.plan().counts[FaultPlan::index(call)]
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn plan(&self) -> MutexGuard<'_, FaultPlan> {
        self.plan.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, call: StoreCall) -> Result<(), StoreError> {
        if self.plan().admit(call) {
            debug!(?call, "injecting store fault");
            return Err(StoreError::unavailable(format!("injected {call:?} fault")));
        }
        Ok(())
    }
}

impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    fn push(&self, path: &StorePath, document: Document) -> Result<RecordKey, StoreError> {
        self.check(StoreCall::Push)?;
        self.inner.push(path, document)
    }

    fn read(&self, path: &StorePath) -> Result<Vec<(RecordKey, Document)>, StoreError> {
        self.check(StoreCall::Read)?;
        self.inner.read(path)
    }

    fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        self.check(StoreCall::Delete)?;
        self.inner.delete(path)
    }
}

#[cfg(test)]
mod tests {
    use pairbox_core::MemoryStore;

    use super::*;
    use crate::SimEnv;

    #[test]
    fn fails_only_the_scheduled_call() {
        let store = FaultyStore::new(MemoryStore::new(SimEnv::with_seed(3)));
        let path = StorePath::parse("chats/a/b").unwrap();
        store.fail_nth(StoreCall::Push, 2);

        assert!(store.push(&path, Document::Bool(true)).is_ok());
        assert!(matches!(
            store.push(&path, Document::Bool(true)),
            Err(StoreError::Unavailable { .. })
        ));
        assert!(store.push(&path, Document::Bool(true)).is_ok());
        assert_eq!(store.calls(StoreCall::Push), 3);
        assert_eq!(store.read(&path).unwrap().len(), 2);
    }

    #[test]
    fn fail_all_until_healed() {
        let store = FaultyStore::new(MemoryStore::new(SimEnv::with_seed(3)));
        let path = StorePath::parse("chats/a/b").unwrap();
        store.fail_all(StoreCall::Read);

        assert!(store.read(&path).is_err());
        assert!(store.read_ordered_by(&path, "timestamp").is_err());

        store.heal();
        assert!(store.read(&path).unwrap().is_empty());
    }
}
