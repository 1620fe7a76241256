//! Team use-case service.

use super::{missing_fields, ServiceError, ServiceResult};
use crate::model::entity::EntityKind;
use crate::model::team::{TeamId, TeamMembership};
use crate::repo::team_repo::{NewTeam, TeamDetail, TeamPatch, TeamRepository};

pub struct TeamService<R: TeamRepository> {
    repo: R,
}

impl<R: TeamRepository> TeamService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a team with its initial members in one transaction.
    ///
    /// Members naming unknown users are skipped.
    pub fn create_team(&mut self, new_team: NewTeam) -> ServiceResult<TeamDetail> {
        let missing = missing_fields(&[("name", new_team.name.as_str())]);
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }
        Ok(self.repo.create_team(new_team)?)
    }

    pub fn get_team(&self, id: TeamId) -> ServiceResult<TeamDetail> {
        self.repo
            .get_team(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Team, id))
    }

    pub fn list_teams(&self) -> ServiceResult<Vec<TeamDetail>> {
        Ok(self.repo.list_teams()?)
    }

    pub fn update_team(&mut self, id: TeamId, patch: TeamPatch) -> ServiceResult<TeamDetail> {
        if patch
            .name
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(ServiceError::MissingFields(vec!["name"]));
        }
        Ok(self.repo.update_team(id, patch)?)
    }

    pub fn members(&self, id: TeamId) -> ServiceResult<Vec<TeamMembership>> {
        Ok(self.repo.list_members(id)?)
    }

    pub fn delete_team(&mut self, id: TeamId) -> ServiceResult<()> {
        Ok(self.repo.delete_team(id)?)
    }
}
