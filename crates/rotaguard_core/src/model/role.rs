//! Role entity and user-role link.

use super::entity::{Entity, EntityId, EntityKind, EntityMeta};
use super::ValidationError;

pub type RoleId = EntityId;

/// Names seeded by `RoleService::seed_default_roles`.
pub const DEFAULT_ROLE_NAMES: [&str; 5] = ["Manager", "Chef", "Waiter", "Cleaner", "Bar staff"];

/// Role attached to newly registered users.
pub const REGISTRATION_ROLE_NAME: &str = "manager";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub meta: EntityMeta,
    /// Unique, compared case-insensitively by the store.
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(None),
            name: name.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        Ok(())
    }
}

impl Entity for Role {
    const KIND: EntityKind = EntityKind::Role;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// Association between one user and one role. Carries no attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRole {
    pub meta: EntityMeta,
    pub user_id: EntityId,
    pub role_id: RoleId,
}

impl UserRole {
    pub fn new(user_id: EntityId, role_id: RoleId) -> Self {
        Self {
            meta: EntityMeta::new(None),
            user_id,
            role_id,
        }
    }
}

impl Entity for UserRole {
    const KIND: EntityKind = EntityKind::UserRole;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
