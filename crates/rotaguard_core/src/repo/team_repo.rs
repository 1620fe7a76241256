//! Team repository: teams and their memberships.
//!
//! # Invariants
//! - A team and its memberships are written in one transaction.
//! - Member entries that reference unknown users are skipped, not rejected.
//! - A user appears at most once per team; later duplicates are dropped.
//! - Replacing members creates fresh membership rows with new human IDs.

use super::user_repo::load_user;
use super::{
    conflict_or_db, id_text, parse_optional_uuid, parse_uuid, read_meta, row_exists, RepoError,
    RepoResult, META_COLUMNS,
};
use crate::model::entity::EntityKind;
use crate::model::team::{Team, TeamId, TeamMembership};
use crate::model::user::UserId;
use crate::sequence::assign_human_id;
use log::warn;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

/// Member entry for team create/update requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeamMember {
    pub user_id: UserId,
    pub summary: Option<String>,
}

/// Input for creating a team together with its initial members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTeam {
    pub name: String,
    pub manager_id: Option<UserId>,
    pub members: Vec<NewTeamMember>,
    pub actor: Option<UserId>,
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the manager.
    pub manager_id: Option<Option<UserId>>,
    /// `Some(list)` replaces the full member set.
    pub members: Option<Vec<NewTeamMember>>,
    pub actor: Option<UserId>,
}

/// Team read model with its memberships in creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<TeamMembership>,
}

/// Repository interface for team operations.
pub trait TeamRepository {
    fn create_team(&mut self, new_team: NewTeam) -> RepoResult<TeamDetail>;
    fn get_team(&self, id: TeamId) -> RepoResult<Option<TeamDetail>>;
    fn list_teams(&self) -> RepoResult<Vec<TeamDetail>>;
    fn update_team(&mut self, id: TeamId, patch: TeamPatch) -> RepoResult<TeamDetail>;
    fn delete_team(&mut self, id: TeamId) -> RepoResult<()>;
    fn list_members(&self, team_id: TeamId) -> RepoResult<Vec<TeamMembership>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn create_team(&mut self, new_team: NewTeam) -> RepoResult<TeamDetail> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut team = Team::new(new_team.name, new_team.manager_id);
        team.meta.last_updated_by_id = new_team.actor;
        team.validate()?;
        ensure_manager_exists(&tx, team.manager_id)?;
        assign_human_id(&tx, &mut team)?;

        tx.execute(
            "INSERT INTO teams (id, human_id, name, manager_id, last_updated_by_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                team.meta.id.to_string(),
                team.meta.human_id,
                team.name.as_str(),
                id_text(team.manager_id),
                id_text(team.meta.last_updated_by_id),
            ],
        )
        .map_err(|err| conflict_or_db(err, EntityKind::Team, || "team already exists".to_string()))?;

        insert_members(&tx, team.meta.id, &new_team.members, new_team.actor)?;
        let detail = load_team_detail(&tx, team.meta.id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Team, team.meta.id))?;
        tx.commit()?;
        Ok(detail)
    }

    fn get_team(&self, id: TeamId) -> RepoResult<Option<TeamDetail>> {
        load_team_detail(self.conn, id)
    }

    fn list_teams(&self) -> RepoResult<Vec<TeamDetail>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY human_id ASC;", team_select_sql()))?;
        let mut rows = stmt.query([])?;
        let mut teams = Vec::new();
        while let Some(row) = rows.next()? {
            teams.push(parse_team_row(row)?);
        }

        let mut details = Vec::with_capacity(teams.len());
        for team in teams {
            let members = load_members(self.conn, team.meta.id)?;
            details.push(TeamDetail { team, members });
        }
        Ok(details)
    }

    fn update_team(&mut self, id: TeamId, patch: TeamPatch) -> RepoResult<TeamDetail> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut team =
            load_team(&tx, id)?.ok_or_else(|| RepoError::not_found(EntityKind::Team, id))?;

        if let Some(name) = patch.name {
            team.name = name.trim().to_string();
        }
        if let Some(manager_id) = patch.manager_id {
            team.manager_id = manager_id;
        }
        team.validate()?;
        ensure_manager_exists(&tx, team.manager_id)?;

        tx.execute(
            "UPDATE teams
             SET
                name = ?2,
                manager_id = ?3,
                last_updated_by_id = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id.to_string(),
                team.name.as_str(),
                id_text(team.manager_id),
                id_text(patch.actor),
            ],
        )?;

        if let Some(members) = patch.members {
            tx.execute(
                "DELETE FROM team_memberships WHERE team_id = ?1;",
                [id.to_string()],
            )?;
            insert_members(&tx, id, &members, patch.actor)?;
        }

        let detail =
            load_team_detail(&tx, id)?.ok_or_else(|| RepoError::not_found(EntityKind::Team, id))?;
        tx.commit()?;
        Ok(detail)
    }

    fn delete_team(&mut self, id: TeamId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM team_memberships WHERE team_id = ?1;",
            [id.to_string()],
        )?;
        let changed = tx.execute("DELETE FROM teams WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Team, id));
        }
        tx.commit()?;
        Ok(())
    }

    fn list_members(&self, team_id: TeamId) -> RepoResult<Vec<TeamMembership>> {
        if !row_exists(self.conn, "teams", team_id)? {
            return Err(RepoError::not_found(EntityKind::Team, team_id));
        }
        load_members(self.conn, team_id)
    }
}

fn ensure_manager_exists(conn: &Connection, manager_id: Option<UserId>) -> RepoResult<()> {
    if let Some(manager_id) = manager_id {
        if load_user(conn, manager_id)?.is_none() {
            return Err(RepoError::not_found(EntityKind::User, manager_id));
        }
    }
    Ok(())
}

fn insert_members(
    tx: &Transaction<'_>,
    team_id: TeamId,
    members: &[NewTeamMember],
    actor: Option<UserId>,
) -> RepoResult<()> {
    let mut seen = HashSet::new();
    for member in members {
        if !row_exists(tx, "users", member.user_id)? {
            warn!("event=team_member_skip module=repo status=skipped reason=unknown_user");
            continue;
        }
        if !seen.insert(member.user_id) {
            continue;
        }

        let mut membership = TeamMembership::new(team_id, member.user_id, member.summary.clone());
        membership.meta.last_updated_by_id = actor;
        assign_human_id(tx, &mut membership)?;
        tx.execute(
            "INSERT INTO team_memberships (
                id,
                human_id,
                team_id,
                user_id,
                summary,
                last_updated_by_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                membership.meta.id.to_string(),
                membership.meta.human_id,
                team_id.to_string(),
                member.user_id.to_string(),
                membership.summary.as_deref(),
                id_text(actor),
            ],
        )
        .map_err(|err| {
            conflict_or_db(err, EntityKind::TeamMembership, || {
                format!("user {} is already a member of team {team_id}", member.user_id)
            })
        })?;
    }
    Ok(())
}

fn load_team_detail(conn: &Connection, id: TeamId) -> RepoResult<Option<TeamDetail>> {
    let Some(team) = load_team(conn, id)? else {
        return Ok(None);
    };
    let members = load_members(conn, id)?;
    Ok(Some(TeamDetail { team, members }))
}

fn load_team(conn: &Connection, id: TeamId) -> RepoResult<Option<Team>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1;", team_select_sql()))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_team_row(row)?));
    }
    Ok(None)
}

fn load_members(conn: &Connection, team_id: TeamId) -> RepoResult<Vec<TeamMembership>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {META_COLUMNS}, team_id, user_id, summary
         FROM team_memberships
         WHERE team_id = ?1
         ORDER BY human_id ASC;"
    ))?;
    let mut rows = stmt.query([team_id.to_string()])?;
    let mut members = Vec::new();
    while let Some(row) = rows.next()? {
        let team_text: String = row.get("team_id")?;
        let user_text: String = row.get("user_id")?;
        members.push(TeamMembership {
            meta: read_meta(row, "team_memberships")?,
            team_id: parse_uuid(&team_text, "team_memberships", "team_id")?,
            user_id: parse_uuid(&user_text, "team_memberships", "user_id")?,
            summary: row.get("summary")?,
        });
    }
    Ok(members)
}

fn team_select_sql() -> String {
    format!("SELECT {META_COLUMNS}, name, manager_id FROM teams")
}

fn parse_team_row(row: &Row<'_>) -> RepoResult<Team> {
    Ok(Team {
        meta: read_meta(row, "teams")?,
        name: row.get("name")?,
        manager_id: parse_optional_uuid(row.get("manager_id")?, "teams", "manager_id")?,
    })
}
