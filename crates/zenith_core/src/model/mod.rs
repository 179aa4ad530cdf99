//! Domain records persisted through the entity layer.

pub mod note;
