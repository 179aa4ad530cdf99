#![allow(dead_code)]

use std::cell::Cell;
use zenith_core::db::open_db_in_memory;
use zenith_core::{
    note_descriptor, EntityTypeDescriptor, KvStore, MemoryKvStore, Note, SqliteKvStore,
    StoreError, StoreResult, UpdateFn,
};

/// Runs `check` once against each backend.
pub fn for_each_backend(mut check: impl FnMut(&dyn KvStore)) {
    let memory = MemoryKvStore::new();
    check(&memory);

    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteKvStore::try_new(&conn).unwrap();
    check(&sqlite);
}

pub fn note(id: &str, updated_at: i64) -> Note {
    Note {
        id: id.to_string(),
        title: format!("title {id}"),
        content: format!("content {id}"),
        created_at: updated_at,
        updated_at,
    }
}

/// Note descriptor without seed records.
pub fn unseeded_notes() -> EntityTypeDescriptor<Note> {
    EntityTypeDescriptor {
        seed_data: Vec::new(),
        ..note_descriptor(0)
    }
}

/// Memory store that starts failing writes (`put` and `update`) after a fixed
/// number of successful ones.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryKvStore,
    writes_before_failure: Cell<Option<usize>>,
}

impl FlakyStore {
    pub fn fail_writes_after(&self, successful_writes: usize) {
        self.writes_before_failure.set(Some(successful_writes));
    }

    pub fn heal(&self) {
        self.writes_before_failure.set(None);
    }

    fn take_write(&self, namespace: &str, key: &str) -> StoreResult<()> {
        match self.writes_before_failure.get() {
            Some(0) => Err(StoreError::Backend(format!(
                "injected write failure for {namespace}/{key}"
            ))),
            Some(remaining) => {
                self.writes_before_failure.set(Some(remaining - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl KvStore for FlakyStore {
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(namespace, key)
    }

    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        self.take_write(namespace, key)?;
        self.inner.put(namespace, key, value)
    }

    fn update(&self, namespace: &str, key: &str, apply: &mut UpdateFn<'_>) -> StoreResult<bool> {
        self.take_write(namespace, key)?;
        self.inner.update(namespace, key, apply)
    }

    fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        self.inner.delete(namespace, key)
    }
}
