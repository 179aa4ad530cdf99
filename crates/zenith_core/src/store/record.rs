//! Entity record store: one serialized record per `(entity_name, id)`.
//!
//! # Invariants
//! - Records are JSON-encoded; the substrate sees opaque bytes.
//! - No caching: every call is a round-trip to the backing store.
//! - Failures propagate unchanged; nothing is retried here.

use super::kv::{decode, encode, KvStore, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Typed point access to records stored in a `KvStore`.
pub struct RecordStore<'s, S: KvStore + ?Sized> {
    kv: &'s S,
}

impl<'s, S: KvStore + ?Sized> RecordStore<'s, S> {
    pub fn new(kv: &'s S) -> Self {
        Self { kv }
    }

    /// Returns `None` when the record was never created or was deleted.
    pub fn get<T: DeserializeOwned>(&self, entity_name: &str, id: &str) -> StoreResult<Option<T>> {
        match self.kv.get(entity_name, id)? {
            Some(bytes) => decode(entity_name, id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Unconditionally overwrites the record stored under `id`.
    pub fn put<T: Serialize>(&self, entity_name: &str, id: &str, record: &T) -> StoreResult<()> {
        let bytes = encode(entity_name, id, record)?;
        self.kv.put(entity_name, id, &bytes)
    }

    /// Returns `true` when a record was removed.
    pub fn delete(&self, entity_name: &str, id: &str) -> StoreResult<bool> {
        self.kv.delete(entity_name, id)
    }

    pub fn exists(&self, entity_name: &str, id: &str) -> StoreResult<bool> {
        self.kv.exists(entity_name, id)
    }
}
