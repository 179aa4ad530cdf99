//! Generic CRUD façade over the record store and secondary index.
//!
//! # Invariants
//! - `create` writes the record before the index entry; `delete` removes the
//!   record before the index entry. Neither pair is atomic: a failure between
//!   the two writes leaves an orphan record or a dangling index entry.
//! - `save` never creates; it requires an existing record with the same id.
//! - `list` skips index entries whose record has disappeared.

use super::descriptor::{validate_id, Entity, EntityId, EntityTypeDescriptor};
use super::error::{EntityError, EntityResult};
use crate::store::{KvStore, RecordStore, SecondaryIndex, StoreError};
use log::{debug, warn};
use std::marker::PhantomData;

/// Pagination request for `EntityRepository::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Opaque cursor from a previous `ListPage::next`; `None` starts at the top.
    pub cursor: Option<String>,
    /// Maximum items per page; `None` reads the whole index.
    pub limit: Option<usize>,
}

impl Page {
    pub fn first(limit: usize) -> Self {
        Self {
            cursor: None,
            limit: Some(limit),
        }
    }

    pub fn after(cursor: impl Into<String>, limit: usize) -> Self {
        Self {
            cursor: Some(cursor.into()),
            limit: Some(limit),
        }
    }
}

/// One page of records in index (insertion) order.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Cursor for the following page, `None` once the index is exhausted.
    pub next: Option<String>,
}

/// Type-level operations for one entity type, bound to an explicit store.
pub struct EntityRepository<'s, S: KvStore + ?Sized, T: Entity> {
    store: &'s S,
    descriptor: &'s EntityTypeDescriptor<T>,
}

impl<'s, S: KvStore + ?Sized, T: Entity> EntityRepository<'s, S, T> {
    /// Binds a validated descriptor to a backing store handle.
    pub fn try_new(store: &'s S, descriptor: &'s EntityTypeDescriptor<T>) -> EntityResult<Self> {
        descriptor.validate()?;
        Ok(Self { store, descriptor })
    }

    pub fn descriptor(&self) -> &EntityTypeDescriptor<T> {
        self.descriptor
    }

    /// Fresh copy of the creation template.
    pub fn initial_state(&self) -> T {
        self.descriptor.initial_state.clone()
    }

    /// Returns a handle addressing a single id. No I/O happens here.
    pub fn entity(&self, id: impl Into<EntityId>) -> EntityHandle<'s, S, T> {
        EntityHandle {
            store: self.store,
            entity_name: self.descriptor.entity_name,
            id: id.into(),
            _record: PhantomData,
        }
    }

    /// Stores `record` under its caller-supplied id and indexes it.
    ///
    /// An existing record with the same id is overwritten; uniqueness is the
    /// caller's responsibility.
    pub fn create(&self, record: T) -> EntityResult<T> {
        let id = record.id().to_string();
        validate_id(&id)?;

        self.records().put(self.descriptor.entity_name, &id, &record)?;
        self.index().add(self.descriptor.index_name, &id)?;
        debug!(
            "event=entity_create module=entity status=ok entity={} id={}",
            self.descriptor.entity_name, id
        );
        Ok(record)
    }

    /// Removes the record and its index entry.
    ///
    /// Returns `true` only if a record existed. A dangling index entry is
    /// still dropped when the record is already gone.
    pub fn delete(&self, id: &str) -> EntityResult<bool> {
        let removed = self.records().delete(self.descriptor.entity_name, id)?;
        let unindexed = self.index().remove(self.descriptor.index_name, id)?;
        if !removed && unindexed {
            warn!(
                "event=entity_delete module=entity status=dangling entity={} id={}",
                self.descriptor.entity_name, id
            );
        } else {
            debug!(
                "event=entity_delete module=entity status=ok entity={} id={} existed={}",
                self.descriptor.entity_name, id, removed
            );
        }
        Ok(removed)
    }

    /// Deletes each id in turn and returns how many records existed.
    pub fn delete_many<I, K>(&self, ids: I) -> EntityResult<usize>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut deleted = 0;
        for id in ids {
            if self.delete(id.as_ref())? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Reads ids from the index, then fetches each record.
    ///
    /// Not a snapshot: ids whose record was deleted in the meantime are
    /// skipped, so a page may hold fewer than `limit` items.
    pub fn list(&self, page: &Page) -> EntityResult<ListPage<T>> {
        let offset = parse_cursor(page.cursor.as_deref())?;
        if page.limit == Some(0) {
            return Err(EntityError::Validation(
                "page limit must be greater than zero".to_string(),
            ));
        }

        let slice = self
            .index()
            .slice(self.descriptor.index_name, offset, page.limit)?;
        let records = self.records();
        let mut items = Vec::with_capacity(slice.ids.len());
        for id in &slice.ids {
            match records.get::<T>(self.descriptor.entity_name, id)? {
                Some(record) => items.push(record),
                None => debug!(
                    "event=entity_list module=entity status=skip_missing entity={} id={}",
                    self.descriptor.entity_name, id
                ),
            }
        }

        Ok(ListPage {
            items,
            next: slice.next_offset.map(|offset| offset.to_string()),
        })
    }

    /// Every live record in index order.
    pub fn list_all(&self) -> EntityResult<Vec<T>> {
        Ok(self.list(&Page::default())?.items)
    }

    /// Drops index entries whose record no longer exists.
    ///
    /// Orphan records (stored but never indexed) cannot be found without a
    /// keyspace scan and are left alone.
    pub fn prune_dangling(&self) -> EntityResult<Vec<EntityId>> {
        let index = self.index();
        let records = self.records();
        let mut pruned = Vec::new();
        for id in index.list(self.descriptor.index_name)? {
            if !records.exists(self.descriptor.entity_name, &id)? {
                index.remove(self.descriptor.index_name, &id)?;
                pruned.push(id);
            }
        }

        if !pruned.is_empty() {
            warn!(
                "event=index_prune module=entity status=ok entity={} pruned={}",
                self.descriptor.entity_name,
                pruned.len()
            );
        }
        Ok(pruned)
    }

    pub(super) fn index(&self) -> SecondaryIndex<'s, S> {
        SecondaryIndex::new(self.store)
    }

    fn records(&self) -> RecordStore<'s, S> {
        RecordStore::new(self.store)
    }
}

/// Per-id handle; every call is a fresh round-trip to the store.
pub struct EntityHandle<'s, S: KvStore + ?Sized, T: Entity> {
    store: &'s S,
    entity_name: &'static str,
    id: EntityId,
    _record: PhantomData<fn() -> T>,
}

impl<'s, S: KvStore + ?Sized, T: Entity> EntityHandle<'s, S, T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn exists(&self) -> EntityResult<bool> {
        Ok(RecordStore::new(self.store).exists(self.entity_name, &self.id)?)
    }

    /// Loads the stored record; a missing record is `NotFound`, never the
    /// descriptor's initial state.
    ///
    /// A record stored under a different id than it carries is corrupt data
    /// and surfaces as a `Store` failure.
    pub fn get_state(&self) -> EntityResult<T> {
        let record = RecordStore::new(self.store)
            .get::<T>(self.entity_name, &self.id)?
            .ok_or_else(|| self.not_found())?;
        if record.id() != self.id {
            return Err(EntityError::Store(StoreError::Backend(format!(
                "stored {} `{}` carries mismatched id `{}`",
                self.entity_name,
                self.id,
                record.id()
            ))));
        }
        Ok(record)
    }

    /// Replaces the whole stored record.
    ///
    /// # Errors
    /// - `Validation` when `record.id()` differs from this handle's id.
    /// - `NotFound` when nothing was created under this id yet.
    pub fn save(&self, record: &T) -> EntityResult<()> {
        if record.id() != self.id {
            return Err(EntityError::Validation(format!(
                "record id `{}` does not match handle id `{}`",
                record.id(),
                self.id
            )));
        }

        let records = RecordStore::new(self.store);
        if !records.exists(self.entity_name, &self.id)? {
            return Err(self.not_found());
        }
        records.put(self.entity_name, &self.id, record)?;
        Ok(())
    }

    /// Read, apply `update`, then save the whole record.
    pub fn mutate(&self, update: impl FnOnce(&mut T)) -> EntityResult<T> {
        let mut record = self.get_state()?;
        update(&mut record);
        self.save(&record)?;
        Ok(record)
    }

    fn not_found(&self) -> EntityError {
        EntityError::NotFound {
            entity: self.entity_name,
            id: self.id.clone(),
        }
    }
}

fn parse_cursor(cursor: Option<&str>) -> EntityResult<usize> {
    match cursor {
        None => Ok(0),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| EntityError::Validation(format!("malformed page cursor `{raw}`"))),
    }
}
