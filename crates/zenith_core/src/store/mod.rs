//! Storage layers beneath the entity façade.
//!
//! # Responsibility
//! - Define the `KvStore` substrate contract and its two backends.
//! - Layer typed record access and the per-type secondary index on top.
//!
//! # Invariants
//! - Record writes and index writes are separate round-trips; nothing here
//!   makes a record+index pair atomic.
//! - Errors from the substrate propagate unchanged.

mod kv;

pub mod index;
pub mod memory;
pub mod record;
pub mod sqlite;

pub use index::{IndexSlice, SecondaryIndex, INDEX_NAMESPACE};
pub use kv::{KvStore, StoreError, StoreResult, UpdateFn};
pub use memory::MemoryKvStore;
pub use record::RecordStore;
pub use sqlite::SqliteKvStore;
