//! Registration and login use-cases.
//!
//! # Responsibility
//! - Validate registration input and create users with the default role.
//! - Verify login credentials against stored argon2id hashes.
//!
//! # Invariants
//! - Plain passwords never reach storage or logs.
//! - Hashing runs before the write transaction opens, so the counter lock is
//!   never held during the slow hash.
//! - Token issuance belongs to the caller; login only authenticates.

use super::password::{hash_password, verify_password};
use super::{missing_fields, ServiceError, ServiceResult};
use crate::model::role::{Role, REGISTRATION_ROLE_NAME};
use crate::model::user::{is_valid_email, User};
use crate::repo::user_repo::UserRepository;
use log::{info, warn};

/// Use-case service for account registration and authentication.
pub struct AuthService<R: UserRepository> {
    repo: R,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user: User,
    /// Role linked to the new account.
    pub role: Role,
}

impl<R: UserRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// - `MissingFields` when any of email/password/name is blank.
    /// - `InvalidInput` when the email is malformed.
    /// - `Conflict` when the email is already registered.
    pub fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> ServiceResult<Registration> {
        let missing = missing_fields(&[("email", email), ("password", password), ("name", name)]);
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(ServiceError::InvalidInput(format!(
                "invalid email address `{email}`"
            )));
        }
        if self.repo.find_user_by_email(email)?.is_some() {
            return Err(ServiceError::Conflict(
                "email address already registered".to_string(),
            ));
        }

        let password_hash = hash_password(password)?;
        let (user, role) = self
            .repo
            .create_user_with_role(User::new(email, password_hash, name), REGISTRATION_ROLE_NAME)?;

        info!(
            "event=user_register module=service status=ok human_id={}",
            user.meta.human_id.unwrap_or_default()
        );
        Ok(Registration { user, role })
    }

    /// Authenticates an account by email and password.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        let missing = missing_fields(&[("email", email), ("password", password)]);
        if !missing.is_empty() {
            return Err(ServiceError::MissingFields(missing));
        }

        match self.repo.find_user_by_email(email)? {
            Some(user) if verify_password(password, &user.password_hash) => {
                info!(
                    "event=user_login module=service status=ok human_id={}",
                    user.meta.human_id.unwrap_or_default()
                );
                Ok(user)
            }
            _ => {
                warn!("event=user_login module=service status=error reason=invalid_credentials");
                Err(ServiceError::InvalidCredentials)
            }
        }
    }
}
