//! User management use-cases: lookup, role assignment, reporting lines.

use super::{ServiceError, ServiceResult};
use crate::model::entity::EntityKind;
use crate::model::role::Role;
use crate::model::user::{User, UserId};
use crate::repo::user_repo::UserRepository;

pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.repo
            .get_user(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::User, id))
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.repo.list_users()?)
    }

    /// Roles currently held by the user, in role creation order.
    pub fn user_roles(&self, id: UserId) -> ServiceResult<Vec<Role>> {
        Ok(self.repo.list_user_roles(id)?)
    }

    /// Replaces all roles of the user with the named roles.
    ///
    /// # Errors
    /// - `RolesNotFound` listing every unknown name; nothing is changed.
    pub fn assign_roles(
        &mut self,
        id: UserId,
        role_names: &[String],
        actor: Option<UserId>,
    ) -> ServiceResult<Vec<Role>> {
        if role_names.iter().any(|name| name.trim().is_empty()) {
            return Err(ServiceError::InvalidInput(
                "role names must not be empty".to_string(),
            ));
        }
        Ok(self.repo.replace_user_roles(id, role_names, actor)?)
    }

    /// Sets or clears the user's manager.
    pub fn set_manager(
        &mut self,
        id: UserId,
        manager_id: Option<UserId>,
        actor: Option<UserId>,
    ) -> ServiceResult<User> {
        Ok(self.repo.set_manager(id, manager_id, actor)?)
    }

    pub fn direct_reports(&self, manager_id: UserId) -> ServiceResult<Vec<User>> {
        Ok(self.repo.list_direct_reports(manager_id)?)
    }

    /// Deletes the user with their role links and memberships.
    pub fn delete_user(&mut self, id: UserId) -> ServiceResult<()> {
        Ok(self.repo.delete_user(id)?)
    }
}
