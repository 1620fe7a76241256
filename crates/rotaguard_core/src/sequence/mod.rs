//! Sequential human-ID allocation.
//!
//! # Responsibility
//! - Hand out per-kind, strictly increasing display numbers on entity insert.
//! - Own every write to `sequence_counters.next_value`.
//!
//! # Invariants
//! - Allocation runs inside the caller's transaction and holds the write lock
//!   on the counter until that transaction commits or rolls back.
//! - A rolled-back allocation is undone with its transaction; the value is
//!   handed to the next successful creation.
//! - Counter rows are created lazily and never deleted.
//!
//! SQLite locks the whole database for writing rather than a single row, so
//! creations of different kinds also queue behind each other while a
//! transaction is open. They still never share or skip each other's values.

mod human_id;

pub use human_id::{
    allocate_human_id, assign_human_id, list_counters, next_human_id, peek_next_value,
    validate_kind_name, SequenceCounter, FIRST_HUMAN_ID,
};

use crate::db::DbError;
use crate::model::entity::{EntityId, EntityKind, HumanId};
use thiserror::Error;

pub type SequenceResult<T> = Result<T, SequenceError>;

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("invalid kind name `{0}`: expected lowercase ascii letters, digits or `_`")]
    InvalidKindName(String),
    #[error("{kind} {id} already carries human_id {human_id}")]
    AlreadyAssigned {
        kind: EntityKind,
        id: EntityId,
        human_id: HumanId,
    },
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for SequenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
