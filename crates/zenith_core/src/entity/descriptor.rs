use super::error::{EntityError, EntityResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;

/// Opaque id, unique within one entity namespace and immutable once assigned.
pub type EntityId = String;

/// A record type that can be persisted through `EntityRepository`.
pub trait Entity: Serialize + DeserializeOwned + Clone {
    fn id(&self) -> &str;
}

/// Static, per-type configuration passed to the generic repository as data.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTypeDescriptor<T> {
    /// Storage namespace for records of this type.
    pub entity_name: &'static str,
    /// Key of the index document enumerating live ids.
    pub index_name: &'static str,
    /// Creation template; never returned in place of a missing record.
    pub initial_state: T,
    /// Baseline records written, in order, on first use.
    pub seed_data: Vec<T>,
}

impl<T: Entity> EntityTypeDescriptor<T> {
    /// Rejects descriptors that would collide with reserved storage or seed
    /// duplicate ids.
    pub fn validate(&self) -> EntityResult<()> {
        for (field, name) in [
            ("entity_name", self.entity_name),
            ("index_name", self.index_name),
        ] {
            if name.trim().is_empty() {
                return Err(EntityError::Validation(format!("{field} cannot be empty")));
            }
            if name.starts_with("__") {
                return Err(EntityError::Validation(format!(
                    "{field} `{name}` uses the reserved `__` prefix"
                )));
            }
        }

        let mut seen = HashSet::new();
        for record in &self.seed_data {
            validate_id(record.id())?;
            if !seen.insert(record.id()) {
                return Err(EntityError::Validation(format!(
                    "duplicate seed id `{}` for `{}`",
                    record.id(),
                    self.entity_name
                )));
            }
        }

        Ok(())
    }
}

pub(crate) fn validate_id(id: &str) -> EntityResult<()> {
    if id.trim().is_empty() {
        return Err(EntityError::Validation("entity id cannot be empty".to_string()));
    }
    if id.chars().any(char::is_control) {
        return Err(EntityError::Validation(format!(
            "entity id {id:?} contains control characters"
        )));
    }
    Ok(())
}
