//! Role repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Role names are unique, compared case-insensitively.
//! - Roles are listed in creation order (`human_id ASC`).
//! - Deleting a role drops its user links but never frees its `human_id`.

use super::{conflict_or_db, id_text, read_meta, RepoError, RepoResult, META_COLUMNS};
use crate::model::entity::EntityKind;
use crate::model::role::{Role, RoleId};
use crate::sequence::assign_human_id;
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

/// Repository interface for role CRUD operations.
pub trait RoleRepository {
    fn create_role(&mut self, role: Role) -> RepoResult<Role>;
    /// Creates every name not yet present, in one transaction.
    ///
    /// Returns only the roles that were created.
    fn create_missing_roles(&mut self, names: &[&str]) -> RepoResult<Vec<Role>>;
    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>>;
    fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>>;
    fn list_roles(&self) -> RepoResult<Vec<Role>>;
    fn delete_role(&mut self, id: RoleId) -> RepoResult<()>;
}

/// SQLite-backed role repository.
pub struct SqliteRoleRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteRoleRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl RoleRepository for SqliteRoleRepository<'_> {
    fn create_role(&mut self, role: Role) -> RepoResult<Role> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = insert_role(&tx, role)?;
        tx.commit()?;
        Ok(created)
    }

    fn create_missing_roles(&mut self, names: &[&str]) -> RepoResult<Vec<Role>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut created = Vec::new();
        for name in names {
            if find_role_by_name(&tx, name)?.is_some() {
                continue;
            }
            created.push(insert_role(&tx, Role::new(*name))?);
        }
        tx.commit()?;

        if !created.is_empty() {
            info!(
                "event=role_seed module=repo status=ok created={}",
                created.len()
            );
        }
        Ok(created)
    }

    fn get_role(&self, id: RoleId) -> RepoResult<Option<Role>> {
        load_role(self.conn, id)
    }

    fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        find_role_by_name(self.conn, name)
    }

    fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY human_id ASC;", role_select_sql()))?;
        let mut rows = stmt.query([])?;
        let mut roles = Vec::new();
        while let Some(row) = rows.next()? {
            roles.push(parse_role_row(row)?);
        }
        Ok(roles)
    }

    fn delete_role(&mut self, id: RoleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM roles WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Role, id));
        }
        Ok(())
    }
}

/// Inserts one role inside an open transaction, stamping its human ID first.
pub(crate) fn insert_role(tx: &Transaction<'_>, mut role: Role) -> RepoResult<Role> {
    role.validate()?;
    assign_human_id(tx, &mut role)?;

    tx.execute(
        "INSERT INTO roles (id, human_id, name, last_updated_by_id)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            role.meta.id.to_string(),
            role.meta.human_id,
            role.name.as_str(),
            id_text(role.meta.last_updated_by_id),
        ],
    )
    .map_err(|err| {
        conflict_or_db(err, EntityKind::Role, || {
            format!("role `{}` already exists", role.name)
        })
    })?;

    load_role(tx, role.meta.id)?
        .ok_or_else(|| RepoError::not_found(EntityKind::Role, role.meta.id))
}

pub(crate) fn load_role(conn: &Connection, id: RoleId) -> RepoResult<Option<Role>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1;", role_select_sql()))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_role_row(row)?));
    }
    Ok(None)
}

pub(crate) fn find_role_by_name(conn: &Connection, name: &str) -> RepoResult<Option<Role>> {
    let mut stmt = conn.prepare(&format!("{} WHERE name = ?1;", role_select_sql()))?;
    let mut rows = stmt.query([name.trim()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_role_row(row)?));
    }
    Ok(None)
}

pub(crate) fn role_select_sql() -> String {
    format!("SELECT {META_COLUMNS}, name FROM roles")
}

pub(crate) fn parse_role_row(row: &Row<'_>) -> RepoResult<Role> {
    Ok(Role {
        meta: read_meta(row, "roles")?,
        name: row.get("name")?,
    })
}
