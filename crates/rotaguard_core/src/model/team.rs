//! Team entity and membership link.

use super::entity::{Entity, EntityId, EntityKind, EntityMeta};
use super::user::UserId;
use super::ValidationError;

pub type TeamId = EntityId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub meta: EntityMeta,
    pub name: String,
    pub manager_id: Option<UserId>,
}

impl Team {
    pub fn new(name: impl Into<String>, manager_id: Option<UserId>) -> Self {
        Self {
            meta: EntityMeta::new(None),
            name: name.into().trim().to_string(),
            manager_id,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        Ok(())
    }
}

impl Entity for Team {
    const KIND: EntityKind = EntityKind::Team;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// Association between a team and a user, with a free-text role summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMembership {
    pub meta: EntityMeta,
    pub team_id: TeamId,
    pub user_id: UserId,
    pub summary: Option<String>,
}

impl TeamMembership {
    pub fn new(team_id: TeamId, user_id: UserId, summary: Option<String>) -> Self {
        Self {
            meta: EntityMeta::new(None),
            team_id,
            user_id,
            summary,
        }
    }
}

impl Entity for TeamMembership {
    const KIND: EntityKind = EntityKind::TeamMembership;

    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}
