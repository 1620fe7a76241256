//! User repository: users, user-role links and the manager hierarchy.
//!
//! # Responsibility
//! - Persist users and their role assignments.
//! - Maintain the self-referential manager relation.
//!
//! # Invariants
//! - Emails are unique, compared case-insensitively.
//! - Role replacement is all-or-nothing: unknown role names abort the whole
//!   transaction before any link is touched.
//! - The manager relation never forms a cycle.

use super::role_repo::{find_role_by_name, insert_role, parse_role_row};
use super::{
    conflict_or_db, id_text, parse_optional_uuid, read_meta, row_exists, RepoError, RepoResult,
    META_COLUMNS,
};
use crate::model::entity::EntityKind;
use crate::model::role::{Role, UserRole};
use crate::model::user::{User, UserId};
use crate::model::ValidationError;
use crate::sequence::assign_human_id;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

/// Repository interface for user, user-role and hierarchy operations.
pub trait UserRepository {
    fn create_user(&mut self, user: User) -> RepoResult<User>;
    /// Creates the user and links it to `role_name`, creating that role
    /// first when it does not exist yet. One transaction.
    fn create_user_with_role(&mut self, user: User, role_name: &str) -> RepoResult<(User, Role)>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    /// Replaces every role link of the user with the named roles.
    fn replace_user_roles(
        &mut self,
        user_id: UserId,
        role_names: &[String],
        actor: Option<UserId>,
    ) -> RepoResult<Vec<Role>>;
    fn list_user_roles(&self, user_id: UserId) -> RepoResult<Vec<Role>>;
    fn set_manager(
        &mut self,
        user_id: UserId,
        manager_id: Option<UserId>,
        actor: Option<UserId>,
    ) -> RepoResult<User>;
    fn list_direct_reports(&self, manager_id: UserId) -> RepoResult<Vec<User>>;
    fn delete_user(&mut self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&mut self, user: User) -> RepoResult<User> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert_user(&tx, user)?;
        tx.commit()?;
        Ok(created)
    }

    fn create_user_with_role(&mut self, user: User, role_name: &str) -> RepoResult<(User, Role)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let role = match find_role_by_name(&tx, role_name)? {
            Some(role) => role,
            None => insert_role(&tx, Role::new(role_name))?,
        };
        let created = insert_user(&tx, user)?;
        insert_user_role(&tx, UserRole::new(created.meta.id, role.meta.id))?;
        tx.commit()?;
        Ok((created, role))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        load_user(self.conn, id)
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE email = ?1;", user_select_sql()))?;
        let mut rows = stmt.query([email.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        query_users(self.conn, &format!("{} ORDER BY human_id ASC;", user_select_sql()), &[])
    }

    fn replace_user_roles(
        &mut self,
        user_id: UserId,
        role_names: &[String],
        actor: Option<UserId>,
    ) -> RepoResult<Vec<Role>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "users", user_id)? {
            return Err(RepoError::not_found(EntityKind::User, user_id));
        }

        // Dedupe on what the store resolved; NOCASE folds ASCII letters only.
        let mut seen_roles = HashSet::new();
        let mut seen_missing = HashSet::new();
        let mut roles = Vec::new();
        let mut missing = Vec::new();
        for name in role_names {
            let name = name.trim();
            match find_role_by_name(&tx, name)? {
                Some(role) => {
                    if seen_roles.insert(role.meta.id) {
                        roles.push(role);
                    }
                }
                None => {
                    if seen_missing.insert(name.to_ascii_lowercase()) {
                        missing.push(name.to_string());
                    }
                }
            }
        }
        if !missing.is_empty() {
            return Err(RepoError::RolesNotFound(missing));
        }

        tx.execute(
            "DELETE FROM user_roles WHERE user_id = ?1;",
            [user_id.to_string()],
        )?;
        for role in &roles {
            let mut link = UserRole::new(user_id, role.meta.id);
            link.meta.last_updated_by_id = actor;
            insert_user_role(&tx, link)?;
        }
        touch_user(&tx, user_id, actor)?;
        tx.commit()?;

        info!(
            "event=user_roles_replace module=repo status=ok roles={}",
            roles.len()
        );
        Ok(roles)
    }

    fn list_user_roles(&self, user_id: UserId) -> RepoResult<Vec<Role>> {
        if !row_exists(self.conn, "users", user_id)? {
            return Err(RepoError::not_found(EntityKind::User, user_id));
        }

        let mut stmt = self.conn.prepare(
            "SELECT
                r.id AS id,
                r.human_id AS human_id,
                r.created_at AS created_at,
                r.updated_at AS updated_at,
                r.last_updated_by_id AS last_updated_by_id,
                r.name AS name
             FROM user_roles ur
             INNER JOIN roles r ON r.id = ur.role_id
             WHERE ur.user_id = ?1
             ORDER BY r.human_id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }

    fn set_manager(
        &mut self,
        user_id: UserId,
        manager_id: Option<UserId>,
        actor: Option<UserId>,
    ) -> RepoResult<User> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !row_exists(&tx, "users", user_id)? {
            return Err(RepoError::not_found(EntityKind::User, user_id));
        }

        if let Some(manager_id) = manager_id {
            if manager_id == user_id {
                return Err(ValidationError::SelfManagement(user_id).into());
            }
            if !row_exists(&tx, "users", manager_id)? {
                return Err(RepoError::not_found(EntityKind::User, manager_id));
            }
            ensure_no_cycle(&tx, user_id, manager_id)?;
        }

        tx.execute(
            "UPDATE users
             SET
                manager_id = ?2,
                last_updated_by_id = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![user_id.to_string(), id_text(manager_id), id_text(actor)],
        )?;
        let updated =
            load_user(&tx, user_id)?.ok_or_else(|| RepoError::not_found(EntityKind::User, user_id))?;
        tx.commit()?;
        Ok(updated)
    }

    fn list_direct_reports(&self, manager_id: UserId) -> RepoResult<Vec<User>> {
        if !row_exists(self.conn, "users", manager_id)? {
            return Err(RepoError::not_found(EntityKind::User, manager_id));
        }
        query_users(
            self.conn,
            &format!(
                "{} WHERE manager_id = ?1 ORDER BY human_id ASC;",
                user_select_sql()
            ),
            &[manager_id.to_string()],
        )
    }

    fn delete_user(&mut self, id: UserId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::User, id));
        }
        Ok(())
    }
}

/// Inserts one user inside an open transaction, stamping its human ID first.
pub(crate) fn insert_user(tx: &Transaction<'_>, mut user: User) -> RepoResult<User> {
    user.validate()?;
    if let Some(manager_id) = user.manager_id {
        if !row_exists(tx, "users", manager_id)? {
            return Err(RepoError::not_found(EntityKind::User, manager_id));
        }
    }
    assign_human_id(tx, &mut user)?;

    tx.execute(
        "INSERT INTO users (
            id,
            human_id,
            email,
            password_hash,
            name,
            manager_id,
            last_updated_by_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            user.meta.id.to_string(),
            user.meta.human_id,
            user.email.as_str(),
            user.password_hash.as_str(),
            user.name.as_str(),
            id_text(user.manager_id),
            id_text(user.meta.last_updated_by_id),
        ],
    )
    .map_err(|err| {
        conflict_or_db(err, EntityKind::User, || {
            "email address already registered".to_string()
        })
    })?;

    load_user(tx, user.meta.id)?.ok_or_else(|| RepoError::not_found(EntityKind::User, user.meta.id))
}

fn insert_user_role(tx: &Transaction<'_>, mut link: UserRole) -> RepoResult<UserRole> {
    assign_human_id(tx, &mut link)?;
    tx.execute(
        "INSERT INTO user_roles (id, human_id, user_id, role_id, last_updated_by_id)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            link.meta.id.to_string(),
            link.meta.human_id,
            link.user_id.to_string(),
            link.role_id.to_string(),
            id_text(link.meta.last_updated_by_id),
        ],
    )
    .map_err(|err| {
        conflict_or_db(err, EntityKind::UserRole, || {
            format!("user {} already holds role {}", link.user_id, link.role_id)
        })
    })?;
    Ok(link)
}

fn touch_user(tx: &Transaction<'_>, user_id: UserId, actor: Option<UserId>) -> RepoResult<()> {
    tx.execute(
        "UPDATE users
         SET
            last_updated_by_id = ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![user_id.to_string(), id_text(actor)],
    )?;
    Ok(())
}

/// Walks up from `manager_id`; reaching `user_id` means the new edge closes a loop.
fn ensure_no_cycle(conn: &Connection, user_id: UserId, manager_id: UserId) -> RepoResult<()> {
    let mut visited = HashSet::new();
    let mut cursor = Some(manager_id);
    while let Some(current) = cursor {
        if current == user_id {
            return Err(RepoError::ManagerCycle(manager_id));
        }
        if !visited.insert(current) {
            break;
        }
        cursor = manager_of(conn, current)?;
    }
    Ok(())
}

fn manager_of(conn: &Connection, user_id: UserId) -> RepoResult<Option<UserId>> {
    let manager: Option<Option<String>> = conn
        .query_row(
            "SELECT manager_id FROM users WHERE id = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    parse_optional_uuid(manager.flatten(), "users", "manager_id")
}

pub(crate) fn load_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let mut users = query_users(
        conn,
        &format!("{} WHERE id = ?1;", user_select_sql()),
        &[id.to_string()],
    )?;
    Ok(users.pop())
}

fn query_users(conn: &Connection, sql: &str, args: &[String]) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(args))?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        users.push(parse_user_row(row)?);
    }
    Ok(users)
}

fn user_select_sql() -> String {
    format!("SELECT {META_COLUMNS}, email, password_hash, name, manager_id FROM users")
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        meta: read_meta(row, "users")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        name: row.get("name")?,
        manager_id: parse_optional_uuid(row.get("manager_id")?, "users", "manager_id")?,
    })
}
