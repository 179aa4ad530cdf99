use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EntityResult<T> = Result<T, EntityError>;

/// Failures surfaced by the entity façade.
///
/// Transport status is never encoded here; callers map kinds to their own
/// protocol.
#[derive(Debug)]
pub enum EntityError {
    /// No record exists for the id, as opposed to a record with blank fields.
    NotFound { entity: &'static str, id: String },
    /// Malformed input rejected before touching the store.
    Validation(String),
    /// Opaque backing-store failure.
    Store(StoreError),
}

impl EntityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for EntityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(message) => write!(f, "invalid input: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EntityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::NotFound { .. } | Self::Validation(_) => None,
        }
    }
}

impl From<StoreError> for EntityError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
