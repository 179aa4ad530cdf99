//! Backing-store contract and its error type.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Transformation run by `KvStore::update` while the entry is locked.
pub type UpdateFn<'a> = dyn FnMut(Option<&[u8]>) -> StoreResult<Option<Vec<u8>>> + 'a;

/// Opaque failure raised by a backing store or by record encoding.
///
/// Callers treat every variant as a backing-store failure; the core never
/// retries, so retry policy stays with whoever invoked the operation.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    /// Non-SQL backend failure, e.g. a poisoned in-memory lock.
    Backend(String),
    Codec {
        namespace: String,
        key: String,
        source: serde_json::Error,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Backend(message) => write!(f, "backing store failure: {message}"),
            Self::Codec {
                namespace,
                key,
                source,
            } => write!(f, "cannot encode/decode `{namespace}/{key}`: {source}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Codec { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Key-value substrate addressed by `(namespace, key)`.
///
/// # Contract
/// - Each call is one round-trip and is atomic for its key.
/// - `put` is an unconditional overwrite.
/// - `update` is a read-modify-write that no other writer can interleave with.
/// - Values are opaque bytes; no caching is expected between calls.
pub trait KvStore {
    fn get(&self, namespace: &str, key: &str) -> StoreResult<Option<Vec<u8>>>;

    fn put(&self, namespace: &str, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Passes the current value to `apply` and stores what it returns, as one
    /// atomic step. `Ok(None)` from `apply` leaves the entry untouched.
    ///
    /// Returns `true` when a new value was written.
    fn update(&self, namespace: &str, key: &str, apply: &mut UpdateFn<'_>) -> StoreResult<bool>;

    /// Returns `true` when an entry was removed.
    fn delete(&self, namespace: &str, key: &str) -> StoreResult<bool>;

    fn exists(&self, namespace: &str, key: &str) -> StoreResult<bool> {
        Ok(self.get(namespace, key)?.is_some())
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(
    namespace: &str,
    key: &str,
    value: &T,
) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| StoreError::Codec {
        namespace: namespace.to_string(),
        key: key.to_string(),
        source,
    })
}

pub(crate) fn decode<T: DeserializeOwned>(
    namespace: &str,
    key: &str,
    bytes: &[u8],
) -> StoreResult<T> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Codec {
        namespace: namespace.to_string(),
        key: key.to_string(),
        source,
    })
}
