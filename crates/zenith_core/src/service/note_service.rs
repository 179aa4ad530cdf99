//! Note use-case service.
//!
//! # Responsibility
//! - Generate ids and timestamps before calling the entity façade.
//! - Seed on first list and sort listings for display.
//! - Merge partial updates before the whole-record save.
//!
//! # Invariants
//! - `list_notes` returns notes sorted by `updated_at DESC`, ties broken by
//!   id so output is deterministic.
//! - Missing notes are reported as `None`/`false`, never as a blank note.

use crate::entity::{EntityError, EntityRepository, EntityTypeDescriptor};
use crate::model::note::{note_descriptor, Note, NotePatch};
use crate::store::KvStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Request payload could not be understood.
    InvalidInput(String),
    /// Target note vanished between the existence check and the read.
    NoteNotFound(String),
    /// Validation or backing-store failure from the entity layer.
    Entity(EntityError),
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Entity(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Entity(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EntityError> for NoteServiceError {
    fn from(value: EntityError) -> Self {
        match value {
            EntityError::NotFound { id, .. } => Self::NoteNotFound(id),
            other => Self::Entity(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

/// Note service façade bound to one backing store.
pub struct NoteService<'s, S: KvStore + ?Sized> {
    store: &'s S,
    descriptor: EntityTypeDescriptor<Note>,
    clock: fn() -> i64,
}

impl<'s, S: KvStore + ?Sized> NoteService<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_clock(store, now_epoch_ms)
    }

    /// Uses `clock` for timestamps; seed times are fixed at construction.
    pub fn with_clock(store: &'s S, clock: fn() -> i64) -> Self {
        Self {
            store,
            descriptor: note_descriptor(clock()),
            clock,
        }
    }

    pub fn descriptor(&self) -> &EntityTypeDescriptor<Note> {
        &self.descriptor
    }

    /// Seeds on first use, then lists every note newest-first.
    pub fn list_notes(&self) -> NoteServiceResult<Vec<Note>> {
        let repo = self.repo()?;
        repo.ensure_seed()?;
        let mut notes = repo.list_all()?;
        notes.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(notes)
    }

    /// Creates a blank note with a fresh UUID.
    pub fn create_note(&self) -> NoteServiceResult<Note> {
        let repo = self.repo()?;
        let now = (self.clock)();
        let mut note = repo.initial_state();
        note.id = Uuid::new_v4().to_string();
        note.created_at = now;
        note.updated_at = now;
        Ok(repo.create(note)?)
    }

    pub fn note_exists(&self, id: &str) -> NoteServiceResult<bool> {
        Ok(self.repo()?.entity(id).exists()?)
    }

    pub fn get_note(&self, id: &str) -> NoteServiceResult<Option<Note>> {
        let repo = self.repo()?;
        let handle = repo.entity(id);
        if !handle.exists()? {
            return Ok(None);
        }
        Ok(Some(handle.get_state()?))
    }

    /// Merges `patch` into the stored note and refreshes `updated_at`.
    ///
    /// Returns `None` when the note does not exist.
    pub fn update_note(&self, id: &str, patch: &NotePatch) -> NoteServiceResult<Option<Note>> {
        let repo = self.repo()?;
        let handle = repo.entity(id);
        if !handle.exists()? {
            return Ok(None);
        }
        let now = (self.clock)();
        let updated = handle.mutate(|note| patch.apply(note, now))?;
        Ok(Some(updated))
    }

    pub fn delete_note(&self, id: &str) -> NoteServiceResult<bool> {
        Ok(self.repo()?.delete(id)?)
    }

    /// Reconciliation pass dropping index entries without a note record.
    pub fn prune_index(&self) -> NoteServiceResult<Vec<String>> {
        Ok(self.repo()?.prune_dangling()?)
    }

    fn repo(&self) -> NoteServiceResult<EntityRepository<'_, S, Note>> {
        Ok(EntityRepository::try_new(self.store, &self.descriptor)?)
    }
}
