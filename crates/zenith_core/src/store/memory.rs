//! In-process `KvStore` for tests and embedded use.

use super::kv::{KvStore, StoreError, StoreResult, UpdateFn};
use std::collections::HashMap;
use std::sync::RwLock;

fn lock_err(context: &'static str) -> StoreError {
    StoreError::Backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory key-value store.
///
/// The lock only provides the per-key atomicity a real substrate would; it
/// does not make multi-key sequences atomic.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn len(&self) -> StoreResult<usize> {
        let entries = self.entries.read().map_err(|_| lock_err("kv.len"))?;
        Ok(entries.len())
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| lock_err("kv.get"))?;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| lock_err("kv.put"))?;
        entries.insert((namespace.to_string(), key.to_string()), value.to_vec());
        Ok(())
    }

    fn update(&self, namespace: &str, key: &str, apply: &mut UpdateFn<'_>) -> StoreResult<bool> {
        let mut entries = self.entries.write().map_err(|_| lock_err("kv.update"))?;
        let entry_key = (namespace.to_string(), key.to_string());
        match apply(entries.get(&entry_key).map(Vec::as_slice))? {
            Some(value) => {
                entries.insert(entry_key, value);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        let mut entries = self.entries.write().map_err(|_| lock_err("kv.delete"))?;
        Ok(entries
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    fn exists(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        let entries = self.entries.read().map_err(|_| lock_err("kv.exists"))?;
        Ok(entries.contains_key(&(namespace.to_string(), key.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKvStore;
    use crate::store::KvStore;

    #[test]
    fn namespaces_do_not_collide() {
        let store = MemoryKvStore::new();
        store.put("note", "a", b"1").unwrap();
        store.put("task", "a", b"2").unwrap();

        assert_eq!(store.get("note", "a").unwrap().as_deref(), Some(&b"1"[..]));
        assert_eq!(store.get("task", "a").unwrap().as_deref(), Some(&b"2"[..]));
        assert!(store.delete("note", "a").unwrap());
        assert!(!store.exists("note", "a").unwrap());
        assert!(store.exists("task", "a").unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn update_sees_current_value_and_can_skip_the_write() {
        let store = MemoryKvStore::new();
        let wrote = store
            .update("counter", "c", &mut |current| {
                assert!(current.is_none());
                Ok(Some(b"1".to_vec()))
            })
            .unwrap();
        assert!(wrote);

        let wrote = store
            .update("counter", "c", &mut |current| {
                assert_eq!(current, Some(&b"1"[..]));
                Ok(None)
            })
            .unwrap();
        assert!(!wrote);
        assert_eq!(store.get("counter", "c").unwrap().as_deref(), Some(&b"1"[..]));
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let store = MemoryKvStore::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        store
                            .update("counter", "c", &mut |current| {
                                let count = current.map_or(0, |bytes| bytes.len());
                                Ok(Some(vec![b'x'; count + 1]))
                            })
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(store.get("counter", "c").unwrap().map(|v| v.len()), Some(800));
    }
}
