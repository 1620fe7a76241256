//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate repository failures into caller-facing error categories.
//!
//! # See also
//! - `crate::api` for the JSON payload shapes built on these services.

pub mod auth_service;
pub mod password;
pub mod role_service;
pub mod team_service;
pub mod user_service;

use crate::model::entity::EntityKind;
use crate::repo::RepoError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for all use-cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One or more required input fields are blank or absent.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// Input is present but malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
    #[error("one or more roles not found: {}", .0.join(", "))]
    RolesNotFound(Vec<String>),
    /// Unique constraint (email, role name, membership) already taken.
    #[error("{0}")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] password::PasswordHashError),
    /// Persistence-layer failure, including lock wait timeouts.
    #[error(transparent)]
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::not_found(kind, id),
            RepoError::RolesNotFound(names) => Self::RolesNotFound(names),
            RepoError::Conflict { detail, .. } => Self::Conflict(detail),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            RepoError::ManagerCycle(id) => {
                Self::InvalidInput(RepoError::ManagerCycle(id).to_string())
            }
            other => Self::Repo(other),
        }
    }
}

/// Collects the names of blank fields, preserving declaration order.
pub(crate) fn missing_fields(fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect()
}
