//! Note domain model and its entity-type descriptor.
//!
//! # Invariants
//! - `id` is assigned once (UUID for user notes, fixed ids for seeds).
//! - Timestamps are Unix epoch milliseconds.
//! - JSON field names are camelCase (`createdAt`, `updatedAt`).

use crate::entity::{Entity, EntityTypeDescriptor};
use serde::{Deserialize, Serialize};

pub const NOTE_ENTITY_NAME: &str = "note";
pub const NOTE_INDEX_NAME: &str = "notes";

const MINUTE_MS: i64 = 60 * 1000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// One user note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    /// Markdown source text.
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Entity for Note {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update accepted by `PUT /api/notes/:id`.
///
/// Absent fields keep their stored value; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Merges present fields into `note` and stamps `updated_at`.
    pub fn apply(&self, note: &mut Note, updated_at: i64) {
        if let Some(title) = &self.title {
            note.title.clone_from(title);
        }
        if let Some(content) = &self.content {
            note.content.clone_from(content);
        }
        note.updated_at = updated_at;
    }
}

/// Template for newly created notes.
pub fn note_initial_state() -> Note {
    Note {
        id: String::new(),
        title: "Untitled Note".to_string(),
        content: String::new(),
        created_at: 0,
        updated_at: 0,
    }
}

/// Welcome notes written on first use, oldest first.
pub fn note_seed_data(now_ms: i64) -> Vec<Note> {
    let seed = |id: &str, title: &str, content: &str, at: i64| Note {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        created_at: at,
        updated_at: at,
    };

    vec![
        seed(
            "note-1",
            "Welcome to Zenith Notes",
            "This is a sample note to get you started. Feel free to edit or delete it.\n\n\
             Zenith Notes offers a clean, fast, and beautiful note-taking experience.",
            now_ms - DAY_MS,
        ),
        seed(
            "note-2",
            "Markdown Support",
            "You can use Markdown to format your notes.\n\n# Heading 1\n## Heading 2\n\n\
             - List item 1\n- List item 2\n\n*Italic text*\n**Bold text**\n`code snippet`",
            now_ms - 30 * MINUTE_MS,
        ),
        seed(
            "note-3",
            "Meeting Notes - Project Phoenix",
            "Attendees: Alice, Bob, Charlie\n\nKey discussion points:\n\
             1. Finalize Q3 roadmap.\n2. Review user feedback from the latest release.\n\
             3. Plan the next marketing campaign.",
            now_ms,
        ),
    ]
}

pub fn note_descriptor(now_ms: i64) -> EntityTypeDescriptor<Note> {
    EntityTypeDescriptor {
        entity_name: NOTE_ENTITY_NAME,
        index_name: NOTE_INDEX_NAME,
        initial_state: note_initial_state(),
        seed_data: note_seed_data(now_ms),
    }
}
