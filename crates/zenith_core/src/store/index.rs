//! Secondary index: ordered live ids per entity type.
//!
//! The substrate has cheap point lookups but no prefix enumeration, so each
//! index is one document (`{"ids":[...]}`) stored under
//! `(INDEX_NAMESPACE, index_name)`. Listing costs one read regardless of how
//! large the rest of the keyspace is.
//!
//! # Invariants
//! - Ids appear at most once and keep insertion order.
//! - `add`/`remove` are idempotent.
//! - `add`/`remove` go through `KvStore::update`, so concurrent writers to the
//!   same index never drop each other's ids.
//! - Index writes are independent of record writes; callers pair them.

use super::kv::{decode, encode, KvStore, StoreResult};
use serde::{Deserialize, Serialize};

/// Reserved namespace holding index documents.
pub const INDEX_NAMESPACE: &str = "__index";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexDocument {
    ids: Vec<String>,
}

/// One window of an index listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSlice {
    pub ids: Vec<String>,
    /// Offset of the first id after this window, if any remain.
    pub next_offset: Option<usize>,
}

pub struct SecondaryIndex<'s, S: KvStore + ?Sized> {
    kv: &'s S,
}

impl<'s, S: KvStore + ?Sized> SecondaryIndex<'s, S> {
    pub fn new(kv: &'s S) -> Self {
        Self { kv }
    }

    /// Appends `id` if absent. Returns `true` when the index changed.
    pub fn add(&self, index_name: &str, id: &str) -> StoreResult<bool> {
        self.modify(index_name, |ids| {
            if ids.iter().any(|existing| existing == id) {
                return false;
            }
            ids.push(id.to_string());
            true
        })
    }

    /// Removes `id` if present. Returns `true` when the index changed.
    pub fn remove(&self, index_name: &str, id: &str) -> StoreResult<bool> {
        self.modify(index_name, |ids| {
            let before = ids.len();
            ids.retain(|existing| existing != id);
            ids.len() != before
        })
    }

    /// All ids in insertion order.
    pub fn list(&self, index_name: &str) -> StoreResult<Vec<String>> {
        Ok(self.load(index_name)?.ids)
    }

    /// Ids in `[offset, offset + limit)`; `limit = None` reads to the end.
    pub fn slice(
        &self,
        index_name: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> StoreResult<IndexSlice> {
        let ids = self.load(index_name)?.ids;
        let total = ids.len();
        let start = offset.min(total);
        let end = limit.map_or(total, |limit| start.saturating_add(limit).min(total));
        Ok(IndexSlice {
            ids: ids[start..end].to_vec(),
            next_offset: (end < total).then_some(end),
        })
    }

    pub fn is_empty(&self, index_name: &str) -> StoreResult<bool> {
        Ok(self.load(index_name)?.ids.is_empty())
    }

    fn load(&self, index_name: &str) -> StoreResult<IndexDocument> {
        match self.kv.get(INDEX_NAMESPACE, index_name)? {
            Some(bytes) => decode(INDEX_NAMESPACE, index_name, &bytes),
            None => Ok(IndexDocument::default()),
        }
    }

    /// Applies `change` to the id list as one atomic substrate update; the
    /// document is rewritten only when `change` reports a difference.
    fn modify(
        &self,
        index_name: &str,
        mut change: impl FnMut(&mut Vec<String>) -> bool,
    ) -> StoreResult<bool> {
        self.kv.update(INDEX_NAMESPACE, index_name, &mut |current| {
            let mut document: IndexDocument = match current {
                Some(bytes) => decode(INDEX_NAMESPACE, index_name, bytes)?,
                None => IndexDocument::default(),
            };
            if !change(&mut document.ids) {
                return Ok(None);
            }
            encode(INDEX_NAMESPACE, index_name, &document).map(Some)
        })
    }
}
