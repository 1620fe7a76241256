use super::{SequenceError, SequenceResult};
use crate::model::entity::{Entity, HumanId};
use log::{debug, error};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Value handed to the first entity of a kind.
pub const FIRST_HUMAN_ID: HumanId = 1;

/// Snapshot of one counter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceCounter {
    pub kind_name: String,
    /// Value the next creation of this kind will receive.
    pub next_value: HumanId,
}

/// Reserves the next human ID for `kind` inside `tx`.
///
/// Locks the counter, reads `next_value` = N, writes N + 1 and returns N.
/// The first call for a kind inserts the row with `next_value` = 2 and
/// returns 1. Nothing is persisted until `tx` commits.
///
/// Callers must open `tx` with `TransactionBehavior::Immediate` so the lock
/// is taken before any read; a busy timeout surfaces as `SequenceError::Db`.
pub fn next_human_id(tx: &Transaction<'_>, kind: &str) -> SequenceResult<HumanId> {
    validate_kind_name(kind)?;

    // Single statement: read and increment cannot interleave with another writer.
    let reserved: Option<HumanId> = tx
        .query_row(
            "UPDATE sequence_counters
             SET next_value = next_value + 1
             WHERE kind_name = ?1
             RETURNING next_value - 1;",
            [kind],
            |row| row.get(0),
        )
        .optional()
        .inspect_err(|err| log_allocation_error(kind, err))?;

    let (human_id, lazy_init) = match reserved {
        Some(value) => (value, false),
        None => {
            tx.execute(
                "INSERT INTO sequence_counters (kind_name, next_value) VALUES (?1, ?2);",
                rusqlite::params![kind, FIRST_HUMAN_ID + 1],
            )
            .inspect_err(|err| log_allocation_error(kind, err))?;
            (FIRST_HUMAN_ID, true)
        }
    };

    debug!(
        "event=human_id_allocate module=sequence status=ok kind={} human_id={} lazy_init={}",
        kind, human_id, lazy_init
    );
    Ok(human_id)
}

/// Pre-insert hook: stamps `entity` with the next human ID of its kind.
///
/// Must be called by every creation path inside the transaction that inserts
/// the entity. Rejects entities that already carry a human ID, since the
/// value is immutable once assigned.
pub fn assign_human_id<E: Entity>(tx: &Transaction<'_>, entity: &mut E) -> SequenceResult<HumanId> {
    if let Some(existing) = entity.human_id() {
        return Err(SequenceError::AlreadyAssigned {
            kind: E::KIND,
            id: entity.id(),
            human_id: existing,
        });
    }

    let human_id = next_human_id(tx, E::KIND.as_str())?;
    entity.meta_mut().human_id = Some(human_id);
    Ok(human_id)
}

/// Allocates one human ID in its own immediate transaction.
///
/// Usable independently of any entity type, e.g. for external numbering.
pub fn allocate_human_id(conn: &mut Connection, kind: &str) -> SequenceResult<HumanId> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let human_id = next_human_id(&tx, kind)?;
    tx.commit()?;
    Ok(human_id)
}

/// Returns the value the next creation of `kind` would receive, or `None`
/// when nothing of that kind has been created yet.
pub fn peek_next_value(conn: &Connection, kind: &str) -> SequenceResult<Option<HumanId>> {
    validate_kind_name(kind)?;
    let value = conn
        .query_row(
            "SELECT next_value FROM sequence_counters WHERE kind_name = ?1;",
            [kind],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

/// Lists all counter rows ordered by kind name.
pub fn list_counters(conn: &Connection) -> SequenceResult<Vec<SequenceCounter>> {
    let mut stmt = conn.prepare(
        "SELECT kind_name, next_value
         FROM sequence_counters
         ORDER BY kind_name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut counters = Vec::new();
    while let Some(row) = rows.next()? {
        counters.push(SequenceCounter {
            kind_name: row.get("kind_name")?,
            next_value: row.get("next_value")?,
        });
    }
    Ok(counters)
}

/// Accepts lowercase ASCII letters, digits and `_`, starting with a letter.
pub fn validate_kind_name(kind: &str) -> SequenceResult<()> {
    let mut chars = kind.chars();
    let valid_head = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let valid_tail = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid_head && valid_tail {
        Ok(())
    } else {
        Err(SequenceError::InvalidKindName(kind.to_string()))
    }
}

fn log_allocation_error(kind: &str, err: &rusqlite::Error) {
    error!(
        "event=human_id_allocate module=sequence status=error kind={} error={}",
        kind, err
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_db_in_memory;
    use crate::model::role::Role;

    #[test]
    fn first_allocation_creates_counter_lazily() {
        let mut conn = open_db_in_memory().unwrap();
        assert_eq!(peek_next_value(&conn, "role").unwrap(), None);

        assert_eq!(allocate_human_id(&mut conn, "role").unwrap(), 1);
        assert_eq!(peek_next_value(&conn, "role").unwrap(), Some(2));

        assert_eq!(allocate_human_id(&mut conn, "role").unwrap(), 2);
        assert_eq!(peek_next_value(&conn, "role").unwrap(), Some(3));
    }

    #[test]
    fn dropped_transaction_releases_reservation() {
        let mut conn = open_db_in_memory().unwrap();
        allocate_human_id(&mut conn, "team").unwrap();

        {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .unwrap();
            assert_eq!(next_human_id(&tx, "team").unwrap(), 2);
            assert_eq!(next_human_id(&tx, "team").unwrap(), 3);
        }

        assert_eq!(peek_next_value(&conn, "team").unwrap(), Some(2));
        assert_eq!(allocate_human_id(&mut conn, "team").unwrap(), 2);
    }

    #[test]
    fn rolled_back_lazy_init_leaves_no_counter_row() {
        let mut conn = open_db_in_memory().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();
        assert_eq!(next_human_id(&tx, "user").unwrap(), 1);
        tx.rollback().unwrap();

        assert!(list_counters(&conn).unwrap().is_empty());
    }

    #[test]
    fn hook_stamps_entity_and_refuses_reassignment() {
        let mut conn = open_db_in_memory().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .unwrap();

        let mut role = Role::new("Chef");
        assert_eq!(assign_human_id(&tx, &mut role).unwrap(), 1);
        assert_eq!(role.meta.human_id, Some(1));

        let err = assign_human_id(&tx, &mut role).unwrap_err();
        assert!(matches!(
            err,
            SequenceError::AlreadyAssigned { human_id: 1, .. }
        ));
        tx.commit().unwrap();

        assert_eq!(peek_next_value(&conn, "role").unwrap(), Some(2));
    }

    #[test]
    fn invalid_kind_names_are_rejected_before_touching_storage() {
        let mut conn = open_db_in_memory().unwrap();
        for kind in ["", "Role", "team-membership", "1user", "user role"] {
            let err = allocate_human_id(&mut conn, kind).unwrap_err();
            assert!(matches!(err, SequenceError::InvalidKindName(_)), "{kind}");
        }
        assert!(list_counters(&conn).unwrap().is_empty());
        validate_kind_name("team_membership").unwrap();
    }

    #[test]
    fn counters_are_listed_by_kind_name() {
        let mut conn = open_db_in_memory().unwrap();
        allocate_human_id(&mut conn, "user").unwrap();
        allocate_human_id(&mut conn, "role").unwrap();
        allocate_human_id(&mut conn, "role").unwrap();

        let counters = list_counters(&conn).unwrap();
        assert_eq!(
            counters,
            vec![
                SequenceCounter {
                    kind_name: "role".to_string(),
                    next_value: 3,
                },
                SequenceCounter {
                    kind_name: "user".to_string(),
                    next_value: 2,
                },
            ]
        );
    }
}
