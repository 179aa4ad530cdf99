//! Core use-case services.
//!
//! # Responsibility
//! - Hold per-route semantics (ids, timestamps, sorting, merges) so the
//!   entity layer stays domain-agnostic.

pub mod note_service;
