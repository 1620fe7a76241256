//! Shared entity shape and kind registry.
//!
//! # Responsibility
//! - Define the metadata every persisted entity carries.
//! - Name each entity kind; the name keys its human-ID counter.
//!
//! # Invariants
//! - `id` is assigned at construction and never changes.
//! - `human_id` is `None` until the pre-insert hook assigns it, then immutable.
//! - Timestamps are epoch milliseconds written by the store.

use uuid::Uuid;

/// Opaque, globally unique identifier; the true referential key.
pub type EntityId = Uuid;

/// Per-kind sequential display number.
pub type HumanId = i64;

/// Logical entity type. Each kind owns an independent counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Role,
    UserRole,
    Team,
    TeamMembership,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::User,
        EntityKind::Role,
        EntityKind::UserRole,
        EntityKind::Team,
        EntityKind::TeamMembership,
    ];

    /// Counter key stored in `sequence_counters.kind_name`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Role => "role",
            Self::UserRole => "user_role",
            Self::Team => "team",
            Self::TeamMembership => "team_membership",
        }
    }

    /// Inverse of [`EntityKind::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata common to every entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    pub id: EntityId,
    pub human_id: Option<HumanId>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Acting user that last modified the entity, when known.
    pub last_updated_by_id: Option<EntityId>,
}

impl EntityMeta {
    /// Fresh metadata for a not-yet-persisted entity.
    pub fn new(actor: Option<EntityId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            human_id: None,
            created_at: 0,
            updated_at: 0,
            last_updated_by_id: actor,
        }
    }
}

/// Implemented by everything that is inserted through the human-ID hook.
pub trait Entity {
    const KIND: EntityKind;

    fn meta(&self) -> &EntityMeta;
    fn meta_mut(&mut self) -> &mut EntityMeta;

    fn id(&self) -> EntityId {
        self.meta().id
    }

    fn human_id(&self) -> Option<HumanId> {
        self.meta().human_id
    }
}

#[cfg(test)]
mod tests {
    use super::EntityKind;

    #[test]
    fn kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("User"), None);
    }
}
