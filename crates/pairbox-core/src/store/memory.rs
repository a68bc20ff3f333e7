//! In-memory document store.

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use super::{Document, DocumentStore, PushKeyGenerator, RecordKey, StorePath};
use crate::{env::Environment, error::StoreError};

/// Document tree held in a `BTreeMap` keyed by full path.
///
/// Children of a path are contiguous in the map because every key below
/// `a/b` starts with `a/b/`.
pub struct MemoryStore<E> {
    env: E,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    documents: BTreeMap<String, Document>,
    keys: PushKeyGenerator,
}

impl<E: Environment> MemoryStore<E> {
    /// Empty store using `env` for push-key time and randomness.
    pub fn new(env: E) -> Self {
        Self { env, inner: Mutex::new(Inner::default()) }
    }

    /// Total number of documents stored at any depth.
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |inner| inner.documents.len())
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::unavailable("memory store lock poisoned"))
    }
}

impl<E: Environment> DocumentStore for MemoryStore<E> {
    fn push(&self, path: &StorePath, document: Document) -> Result<RecordKey, StoreError> {
        let now = self.env.now().timestamp_millis();
        let mut inner = self.lock()?;

        let key = inner.keys.next_key(now, |buf| self.env.random_bytes(buf));
        inner.documents.insert(path.record(&key)?.to_string(), document);
        Ok(key)
    }

    fn read(&self, path: &StorePath) -> Result<Vec<(RecordKey, Document)>, StoreError> {
        let prefix = format!("{path}/");
        let inner = self.lock()?;

        Ok(inner
            .documents
            .range(prefix.clone()..)
            .take_while(|(full, _)| full.starts_with(&prefix))
            .filter_map(|(full, document)| {
                let child = &full[prefix.len()..];
                (!child.contains('/')).then(|| (RecordKey::new(child), document.clone()))
            })
            .collect())
    }

    fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        let exact = path.to_string();
        let prefix = format!("{exact}/");
        let mut inner = self.lock()?;

        inner.documents.retain(|full, _| full != &exact && !full.starts_with(&prefix));
        Ok(())
    }
}
