//! SQLite-backed `KvStore`.
//!
//! # Invariants
//! - Every entry lives in `kv_entries`, keyed by `(namespace, key)`.
//! - Each operation is a single statement, so it is atomic per key.
//! - `update` holds the write lock (`BEGIN IMMEDIATE`) from read to write,
//!   which also serializes it against other connections to the same file.
//! - `updated_at` is the Unix epoch millisecond of the last write.
//! - Connections must be bootstrapped through `db::open_db*` first.

use super::kv::{KvStore, StoreError, StoreResult, UpdateFn};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

const KV_TABLE: &str = "kv_entries";
const KV_COLUMNS: [&str; 4] = ["namespace", "key", "value", "updated_at"];

/// Durable key-value store over a migrated SQLite connection.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a migrated connection, rejecting ones without the kv schema.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_kv_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
        select_value(self.conn, namespace, key)
    }

    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> StoreResult<()> {
        upsert_value(self.conn, namespace, key, value)
    }

    fn update(&self, namespace: &str, key: &str, apply: &mut UpdateFn<'_>) -> StoreResult<bool> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = select_value(&tx, namespace, key)?;
        let Some(next) = apply(current.as_deref())? else {
            return Ok(false);
        };
        upsert_value(&tx, namespace, key, &next)?;
        tx.commit()?;
        Ok(true)
    }

    fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM kv_entries WHERE namespace = ?1 AND key = ?2;",
            params![namespace, key],
        )?;
        Ok(changed > 0)
    }

    fn exists(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM kv_entries
                WHERE namespace = ?1
                  AND key = ?2
            );",
            params![namespace, key],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn select_value(conn: &Connection, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let value = conn
        .query_row(
            "SELECT value
             FROM kv_entries
             WHERE namespace = ?1
               AND key = ?2;",
            params![namespace, key],
            |row| row.get::<_, Vec<u8>>(0),
        )
        .optional()?;
    Ok(value)
}

fn upsert_value(conn: &Connection, namespace: &str, key: &str, value: &[u8]) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO kv_entries (namespace, key, value, updated_at)
         VALUES (?1, ?2, ?3, CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
         ON CONFLICT (namespace, key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![namespace, key, value],
    )?;
    Ok(())
}

fn ensure_kv_connection_ready(conn: &Connection) -> StoreResult<()> {
    if !table_exists(conn, KV_TABLE)? {
        return Err(StoreError::MissingRequiredTable(KV_TABLE));
    }

    for column in KV_COLUMNS {
        if !table_has_column(conn, KV_TABLE, column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: KV_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::SqliteKvStore;
    use crate::db::open_db_in_memory;
    use crate::store::{KvStore, StoreError};
    use rusqlite::Connection;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn updated_at(conn: &Connection, key: &str) -> i64 {
        conn.query_row(
            "SELECT updated_at FROM kv_entries WHERE namespace = 'note' AND key = ?1;",
            [key],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn updated_at_has_millisecond_precision() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();
        let before_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;

        store.put("note", "a", b"1").unwrap();
        let first = updated_at(&conn, "a");
        std::thread::sleep(Duration::from_millis(20));
        store.put("note", "a", b"2").unwrap();
        let second = updated_at(&conn, "a");

        assert!((first - before_ms).abs() < 5_000);
        assert!(second > first, "{second} should follow {first}");
        assert!(second - first < 1_000);
    }

    #[test]
    fn update_commits_value_or_leaves_entry_untouched() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();

        assert!(store
            .update("note", "a", &mut |current| {
                assert!(current.is_none());
                Ok(Some(b"first".to_vec()))
            })
            .unwrap());
        assert!(!store
            .update("note", "a", &mut |current| {
                assert_eq!(current, Some(&b"first"[..]));
                Ok(None)
            })
            .unwrap());
        assert_eq!(store.get("note", "a").unwrap().as_deref(), Some(&b"first"[..]));
    }

    #[test]
    fn failed_update_rolls_back_and_releases_the_lock() {
        let conn = open_db_in_memory().unwrap();
        let store = SqliteKvStore::try_new(&conn).unwrap();
        store.put("note", "a", b"kept").unwrap();

        let err = store
            .update("note", "a", &mut |_| Err(StoreError::Backend("rejected".into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(conn.is_autocommit());

        store.put("note", "b", b"after").unwrap();
        assert_eq!(store.get("note", "a").unwrap().as_deref(), Some(&b"kept"[..]));
    }
}
