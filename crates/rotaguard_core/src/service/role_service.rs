//! Role use-case service.

use super::{missing_fields, ServiceError, ServiceResult};
use crate::model::entity::EntityKind;
use crate::model::role::{Role, RoleId, DEFAULT_ROLE_NAMES};
use crate::model::user::UserId;
use crate::repo::role_repo::RoleRepository;
use log::info;
use uuid::Uuid;

pub struct RoleService<R: RoleRepository> {
    repo: R,
}

impl<R: RoleRepository> RoleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a role; the store assigns its opaque id and human id.
    pub fn create_role(&mut self, name: &str, actor: Option<UserId>) -> ServiceResult<Role> {
        let missing = missing_fields(&[("name", name)]);
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }

        let mut role = Role::new(name);
        role.meta.last_updated_by_id = actor;
        Ok(self.repo.create_role(role)?)
    }

    pub fn get_role(&self, id: RoleId) -> ServiceResult<Role> {
        self.repo
            .get_role(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Role, id))
    }

    /// Looks up a role by the textual id received from a client.
    ///
    /// Non-UUID input is rejected as `InvalidInput`, not `NotFound`.
    pub fn get_role_str(&self, id: &str) -> ServiceResult<Role> {
        let parsed = Uuid::parse_str(id.trim()).map_err(|_| {
            ServiceError::InvalidInput(format!("invalid id format: `{id}` is not a valid UUID"))
        })?;
        self.get_role(parsed)
    }

    pub fn list_roles(&self) -> ServiceResult<Vec<Role>> {
        Ok(self.repo.list_roles()?)
    }

    /// Deletes a role. Its human id is never handed out again.
    pub fn delete_role(&mut self, id: RoleId) -> ServiceResult<()> {
        Ok(self.repo.delete_role(id)?)
    }

    /// Creates the default scheduling roles that do not exist yet.
    ///
    /// Returns the names that were created; empty when all already existed.
    pub fn seed_default_roles(&mut self) -> ServiceResult<Vec<String>> {
        let created = self.repo.create_missing_roles(&DEFAULT_ROLE_NAMES)?;
        let names: Vec<String> = created.into_iter().map(|role| role.name).collect();
        info!(
            "event=role_seed module=service status=ok created={}",
            names.len()
        );
        Ok(names)
    }
}
