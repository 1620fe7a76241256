//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Every insert runs `sequence::assign_human_id` inside the same immediate
//!   transaction as the row write; no other path stamps `human_id`.
//! - Repository writes validate entities before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod role_repo;
pub mod team_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::entity::{EntityId, EntityKind, EntityMeta};
use crate::model::ValidationError;
use crate::sequence::SequenceError;
use rusqlite::{Connection, Row};
use thiserror::Error;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Column list shared by every entity table, in `read_meta` order.
pub(crate) const META_COLUMNS: &str = "id, human_id, created_at, updated_at, last_updated_by_id";

/// Generic repository error for persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: EntityId },
    #[error("roles not found: {}", .0.join(", "))]
    RolesNotFound(Vec<String>),
    #[error("{detail}")]
    Conflict { kind: EntityKind, detail: String },
    #[error("assigning this manager would create a reporting cycle through user {0}")]
    ManagerCycle(EntityId),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    pub(crate) fn not_found(kind: EntityKind, id: EntityId) -> Self {
        Self::NotFound { kind, id }
    }

    /// Whether the write lock could not be taken within the busy timeout,
    /// whichever layer surfaced it.
    pub fn is_busy(&self) -> bool {
        match self {
            Self::Db(db) | Self::Sequence(SequenceError::Db(db)) => db.is_busy(),
            _ => false,
        }
    }
}

/// Maps unique-constraint failures on insert/update to `Conflict`.
pub(crate) fn conflict_or_db(
    err: rusqlite::Error,
    kind: EntityKind,
    detail: impl FnOnce() -> String,
) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::Conflict {
            kind,
            detail: detail(),
        }
    } else {
        err.into()
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn read_meta(row: &Row<'_>, table: &str) -> RepoResult<EntityMeta> {
    let id_text: String = row.get("id")?;
    let human_id: i64 = row.get("human_id")?;
    if human_id < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid human_id `{human_id}` in {table}.human_id"
        )));
    }
    let last_updated_by_id = row
        .get::<_, Option<String>>("last_updated_by_id")?
        .map(|value| parse_uuid(&value, table, "last_updated_by_id"))
        .transpose()?;

    Ok(EntityMeta {
        id: parse_uuid(&id_text, table, "id")?,
        human_id: Some(human_id),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        last_updated_by_id,
    })
}

pub(crate) fn parse_uuid(value: &str, table: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in {table}.{column}"))
    })
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    table: &str,
    column: &str,
) -> RepoResult<Option<Uuid>> {
    value
        .map(|text| parse_uuid(&text, table, column))
        .transpose()
}

pub(crate) fn id_text(id: Option<EntityId>) -> Option<String> {
    id.map(|value| value.to_string())
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
