//! Domain model for users, roles, teams and their links.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Share one metadata shape (`EntityMeta`) across every entity kind.
//!
//! # Invariants
//! - Every entity is referenced by a stable opaque `EntityId`.
//! - `human_id` is display-only; it is never used as a referential key.
//! - Deleting an entity never frees its `human_id` for reuse.

pub mod entity;
pub mod role;
pub mod team;
pub mod user;

use thiserror::Error;

/// Field-level validation failures raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("invalid email address `{0}`")]
    InvalidEmail(String),
    #[error("user {0} cannot manage themselves")]
    SelfManagement(entity::EntityId),
}
