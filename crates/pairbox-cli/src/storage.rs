//! redb-backed document store.
//!
//! One table maps full document paths to CBOR-encoded documents:
//!
//! ```text
//! documents: "chats/alice/bob/-NcK2...": cbor({ sender, text, timestamp })
//! ```
//!
//! Every path below `a/b` starts with `a/b/`, so children of a node are a
//! contiguous key range. Each call runs in its own transaction.

use std::{
    path::Path,
    sync::{Mutex, PoisonError},
};

use pairbox_core::{
    Document, DocumentStore, Environment, RecordKey, StoreError, StorePath,
    store::PushKeyGenerator,
};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition, TableError};
use tracing::debug;

/// Table holding every document, keyed by full path.
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// Persistent document store.
pub struct RedbStore<E> {
    db: Database,
    env: E,
    keys: Mutex<PushKeyGenerator>,
}

impl<E: Environment> RedbStore<E> {
    /// Open the database at `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>, env: E) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(db_error)?;

        // Create the table up front so reads on a fresh file see it.
        let txn = db.begin_write().map_err(db_error)?;
        txn.open_table(DOCUMENTS).map_err(db_error)?;
        txn.commit().map_err(db_error)?;

        debug!(path = %path.display(), "document store opened");
        Ok(Self { db, env, keys: Mutex::new(PushKeyGenerator::new()) })
    }

    /// Total number of documents at any depth.
    pub fn len(&self) -> Result<usize, StoreError> {
        let txn = self.db.begin_read().map_err(db_error)?;
        let table = match txn.open_table(DOCUMENTS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(db_error(e)),
        };
        let count = table.len().map_err(db_error)?;
        Ok(usize::try_from(count).unwrap_or(usize::MAX))
    }
}

impl<E: Environment> DocumentStore for RedbStore<E> {
    fn push(&self, path: &StorePath, document: Document) -> Result<RecordKey, StoreError> {
        let key = {
            let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
            keys.next_key(self.env.now().timestamp_millis(), |buf| self.env.random_bytes(buf))
        };
        let full = path.record(&key)?.to_string();
        let bytes = encode(&document)?;

        let txn = self.db.begin_write().map_err(db_error)?;
        {
            let mut table = txn.open_table(DOCUMENTS).map_err(db_error)?;
            table.insert(full.as_str(), bytes.as_slice()).map_err(db_error)?;
        }
        txn.commit().map_err(db_error)?;
        Ok(key)
    }

    fn read(&self, path: &StorePath) -> Result<Vec<(RecordKey, Document)>, StoreError> {
        let prefix = format!("{path}/");

        let txn = self.db.begin_read().map_err(db_error)?;
        let table = match txn.open_table(DOCUMENTS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(db_error(e)),
        };

        let mut children = Vec::new();
        for entry in table.range(prefix.as_str()..).map_err(db_error)? {
            let (full, bytes) = entry.map_err(db_error)?;
            let Some(child) = full.value().strip_prefix(prefix.as_str()) else {
                break;
            };
            if child.contains('/') {
                continue;
            }
            children.push((RecordKey::new(child), decode(bytes.value())?));
        }
        Ok(children)
    }

    fn delete(&self, path: &StorePath) -> Result<(), StoreError> {
        let exact = path.to_string();
        let prefix = format!("{exact}/");

        let txn = self.db.begin_write().map_err(db_error)?;
        {
            let mut table = txn.open_table(DOCUMENTS).map_err(db_error)?;

            let mut doomed = Vec::new();
            for entry in table.range(prefix.as_str()..).map_err(db_error)? {
                let (full, _) = entry.map_err(db_error)?;
                if !full.value().starts_with(prefix.as_str()) {
                    break;
                }
                doomed.push(full.value().to_string());
            }
            doomed.push(exact);

            for full in &doomed {
                table.remove(full.as_str()).map_err(db_error)?;
            }
        }
        txn.commit().map_err(db_error)?;
        Ok(())
    }
}

fn encode(document: &Document) -> Result<Vec<u8>, StoreError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(document, &mut bytes)
        .map_err(|e| StoreError::Encoding { reason: e.to_string() })?;
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<Document, StoreError> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Encoding { reason: e.to_string() })
}

fn db_error(error: impl Into<redb::Error>) -> StoreError {
    StoreError::unavailable(error.into())
}
