//! Transport-agnostic note API handlers.
//!
//! Each handler mirrors one HTTP route and returns the status code plus the
//! JSON envelope a router would send. Binding to a socket is left to callers.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /api/notes` | [`list_notes`] |
//! | `POST /api/notes` | [`create_note`] |
//! | `GET /api/notes/:id` | [`get_note`] |
//! | `PUT /api/notes/:id` | [`update_note`] |
//! | `DELETE /api/notes/:id` | [`delete_note`] |

use crate::entity::EntityError;
use crate::model::note::{Note, NotePatch};
use crate::service::note_service::{NoteService, NoteServiceError};
use crate::store::KvStore;
use log::{error, warn};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

const NOTE_NOT_FOUND: &str = "Note not found";
const INTERNAL_ERROR: &str = "Internal Server Error";

/// Response envelope: `{success:true,data}` or `{success:false,error}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure(String),
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let mut envelope = serializer.serialize_struct("ApiResponse", 2)?;
        match self {
            Self::Success(data) => {
                envelope.serialize_field("success", &true)?;
                envelope.serialize_field("data", data)?;
            }
            Self::Failure(message) => {
                envelope.serialize_field("success", &false)?;
                envelope.serialize_field("error", message)?;
            }
        }
        envelope.end()
    }
}

/// Status code paired with the envelope body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply<T> {
    pub status: u16,
    pub body: ApiResponse<T>,
}

impl<T> ApiReply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK,
            body: ApiResponse::Success(data),
        }
    }

    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiResponse::Failure(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::failure(STATUS_NOT_FOUND, NOTE_NOT_FOUND)
    }
}

impl<T: Serialize> ApiReply<T> {
    /// Serializes the envelope body.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.body)
    }
}

/// Payload returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub id: String,
    pub deleted: bool,
}

/// `GET /api/notes`: seed on first use, then all notes newest-first.
pub fn list_notes<S: KvStore + ?Sized>(service: &NoteService<'_, S>) -> ApiReply<Vec<Note>> {
    match service.list_notes() {
        Ok(notes) => ApiReply::ok(notes),
        Err(err) => error_reply("list_notes", &err),
    }
}

/// `POST /api/notes`: blank note with a fresh id and timestamps.
pub fn create_note<S: KvStore + ?Sized>(service: &NoteService<'_, S>) -> ApiReply<Note> {
    match service.create_note() {
        Ok(note) => ApiReply::ok(note),
        Err(err) => error_reply("create_note", &err),
    }
}

/// `GET /api/notes/:id`.
pub fn get_note<S: KvStore + ?Sized>(service: &NoteService<'_, S>, id: &str) -> ApiReply<Note> {
    match service.get_note(id) {
        Ok(Some(note)) => ApiReply::ok(note),
        Ok(None) => ApiReply::not_found(),
        Err(err) => error_reply("get_note", &err),
    }
}

/// `PUT /api/notes/:id` with a JSON body of optional `title`/`content`.
///
/// Existence is checked before the body is parsed, so an unknown id is a 404
/// even when the body is malformed.
pub fn update_note<S: KvStore + ?Sized>(
    service: &NoteService<'_, S>,
    id: &str,
    body: &str,
) -> ApiReply<Note> {
    match service.note_exists(id) {
        Ok(true) => {}
        Ok(false) => return ApiReply::not_found(),
        Err(err) => return error_reply("update_note", &err),
    }

    let patch = match serde_json::from_str::<NotePatch>(body) {
        Ok(patch) => patch,
        Err(err) => {
            let err = NoteServiceError::InvalidInput(format!("malformed note body: {err}"));
            return error_reply("update_note", &err);
        }
    };

    match service.update_note(id, &patch) {
        Ok(Some(note)) => ApiReply::ok(note),
        Ok(None) => ApiReply::not_found(),
        Err(err) => error_reply("update_note", &err),
    }
}

/// `DELETE /api/notes/:id`.
pub fn delete_note<S: KvStore + ?Sized>(
    service: &NoteService<'_, S>,
    id: &str,
) -> ApiReply<DeleteResult> {
    match service.delete_note(id) {
        Ok(true) => ApiReply::ok(DeleteResult {
            id: id.to_string(),
            deleted: true,
        }),
        Ok(false) => ApiReply::not_found(),
        Err(err) => error_reply("delete_note", &err),
    }
}

/// Maps a service failure onto a status code and logs it without payloads.
///
/// Backing-store detail is logged only; a 500 body carries a fixed message.
pub fn error_reply<T>(operation: &'static str, err: &NoteServiceError) -> ApiReply<T> {
    let status = status_for(err);
    if status >= STATUS_INTERNAL_ERROR {
        error!("event=api_error module=api status=error op={operation} http_status={status} error={err}");
        return ApiReply::failure(status, INTERNAL_ERROR);
    }
    warn!("event=api_error module=api status=rejected op={operation} http_status={status}");

    match err {
        NoteServiceError::NoteNotFound(_) => ApiReply::not_found(),
        other => ApiReply::failure(status, other.to_string()),
    }
}

fn status_for(err: &NoteServiceError) -> u16 {
    match err {
        NoteServiceError::NoteNotFound(_) => STATUS_NOT_FOUND,
        NoteServiceError::InvalidInput(_) => STATUS_BAD_REQUEST,
        NoteServiceError::Entity(EntityError::NotFound { .. }) => STATUS_NOT_FOUND,
        NoteServiceError::Entity(EntityError::Validation(_)) => STATUS_BAD_REQUEST,
        NoteServiceError::Entity(EntityError::Store(_)) => STATUS_INTERNAL_ERROR,
    }
}
