//! Indexed entity persistence.
//!
//! # Responsibility
//! - Describe entity types as data (`EntityTypeDescriptor`).
//! - Compose record storage, the secondary index and seeding into one CRUD
//!   entry point (`EntityRepository` / `EntityHandle`).
//!
//! # Invariants
//! - Under normal operation every indexed id has a record and vice versa.
//! - Ids are supplied by callers and never rewritten.
//! - Every operation takes an explicit store handle; there is no global store.

mod descriptor;
mod error;
mod repository;
mod seed;

pub use descriptor::{Entity, EntityId, EntityTypeDescriptor};
pub use error::{EntityError, EntityResult};
pub use repository::{EntityHandle, EntityRepository, ListPage, Page};
