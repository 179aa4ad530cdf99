//! Core domain logic for Zenith Notes.
//!
//! The heart of the crate is a generic indexed entity store: one durable
//! record per `(entity type, id)`, an ordered per-type id index for
//! enumeration, and idempotent seeding. Notes are the only entity type today;
//! the note service and API handlers sit on top of that layer.

pub mod api;
pub mod db;
pub mod entity;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use api::{ApiReply, ApiResponse, DeleteResult};
pub use entity::{
    Entity, EntityError, EntityHandle, EntityId, EntityRepository, EntityResult,
    EntityTypeDescriptor, ListPage, Page,
};
pub use logging::{default_log_level, init_logging, logging_status, LogSink};
pub use model::note::{note_descriptor, Note, NotePatch};
pub use service::note_service::{NoteService, NoteServiceError};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult, UpdateFn};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
