//! User entity.
//!
//! # Invariants
//! - `email` is unique (case-insensitive) across users.
//! - `password_hash` holds an argon2id PHC string, never a plain password.
//! - A user has at most one manager and never manages themselves.

use super::entity::{Entity, EntityId, EntityKind, EntityMeta};
use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

pub type UserId = EntityId;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub meta: EntityMeta,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub manager_id: Option<UserId>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            meta: EntityMeta::new(None),
            email: email.into().trim().to_string(),
            password_hash: password_hash.into(),
            name: name.into().trim().to_string(),
            manager_id: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::EmptyField("email"));
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.password_hash.is_empty() {
            return Err(ValidationError::EmptyField("password_hash"));
        }
        if self.name.is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if self.manager_id == Some(self.meta.id) {
            return Err(ValidationError::SelfManagement(self.meta.id));
        }
        Ok(())
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// Loose shape check; deliverability is not our concern.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}
