//! JSON request/response payloads for the HTTP surface.
//!
//! # Responsibility
//! - Define wire shapes for registration, login, roles, users and teams.
//! - Map service errors to HTTP status codes and error bodies.
//!
//! # Invariants
//! - Views expose both the opaque `id` and the read-only `human_id`.
//! - Request payloads carry no `human_id`; a client-sent value is ignored.
//! - Missing request fields deserialize to blanks so the service reports
//!   them together instead of failing on the first one.

use crate::model::entity::HumanId;
use crate::model::role::Role;
use crate::model::team::TeamMembership;
use crate::model::user::{User, UserId};
use crate::repo::team_repo::{NewTeam, NewTeamMember, TeamDetail, TeamPatch};
use crate::sequence::SequenceCounter;
use crate::service::{ServiceError, ServiceResult};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssignRolesRequest {
    #[serde(default)]
    pub role_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamMemberPayload {
    pub user_id: String,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Body for team create (`POST`) and update (`PUT`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TeamRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Absent leaves the manager untouched on update; `null` clears it.
    #[serde(default, deserialize_with = "present_or_null")]
    pub manager_id: Option<Option<String>>,
    #[serde(default)]
    pub members: Option<Vec<TeamMemberPayload>>,
}

impl TeamRequest {
    pub fn into_new_team(self, actor: Option<UserId>) -> ServiceResult<NewTeam> {
        Ok(NewTeam {
            name: self.name.unwrap_or_default(),
            manager_id: parse_manager(self.manager_id.flatten())?,
            members: self.members.map(parse_members).unwrap_or_default(),
            actor,
        })
    }

    pub fn into_patch(self, actor: Option<UserId>) -> ServiceResult<TeamPatch> {
        let manager_id = match self.manager_id {
            Some(value) => Some(parse_manager(value)?),
            None => None,
        };
        Ok(TeamPatch {
            name: self.name,
            manager_id,
            members: self.members.map(parse_members),
            actor,
        })
    }
}

fn parse_manager(value: Option<String>) -> ServiceResult<Option<UserId>> {
    value
        .map(|text| {
            Uuid::parse_str(text.trim()).map_err(|_| {
                ServiceError::InvalidInput(format!("invalid manager_id `{text}`"))
            })
        })
        .transpose()
}

/// Entries whose `user_id` is not a UUID cannot name a user, so they are
/// skipped the same way as ids of unknown users.
fn parse_members(members: Vec<TeamMemberPayload>) -> Vec<NewTeamMember> {
    members
        .into_iter()
        .filter_map(|member| {
            Uuid::parse_str(member.user_id.trim())
                .ok()
                .map(|user_id| NewTeamMember {
                    user_id,
                    summary: member.summary,
                })
        })
        .collect()
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleView {
    pub id: String,
    pub human_id: HumanId,
    pub name: String,
}

impl From<&Role> for RoleView {
    fn from(role: &Role) -> Self {
        Self {
            id: role.meta.id.to_string(),
            human_id: role.meta.human_id.unwrap_or_default(),
            name: role.name.clone(),
        }
    }
}

/// Public user shape. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub human_id: HumanId,
    pub email: String,
    pub name: String,
    pub manager_id: Option<String>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.meta.id.to_string(),
            human_id: user.meta.human_id.unwrap_or_default(),
            email: user.email.clone(),
            name: user.name.clone(),
            manager_id: user.manager_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMemberView {
    pub user_id: String,
    pub human_id: HumanId,
    pub summary: Option<String>,
}

impl From<&TeamMembership> for TeamMemberView {
    fn from(membership: &TeamMembership) -> Self {
        Self {
            user_id: membership.user_id.to_string(),
            human_id: membership.meta.human_id.unwrap_or_default(),
            summary: membership.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamView {
    pub id: String,
    pub human_id: HumanId,
    pub name: String,
    pub manager_id: Option<String>,
    pub members: Vec<TeamMemberView>,
}

impl From<&TeamDetail> for TeamView {
    fn from(detail: &TeamDetail) -> Self {
        Self {
            id: detail.team.meta.id.to_string(),
            human_id: detail.team.meta.human_id.unwrap_or_default(),
            name: detail.team.name.clone(),
            manager_id: detail.team.manager_id.map(|id| id.to_string()),
            members: detail.members.iter().map(TeamMemberView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterView {
    pub kind_name: String,
    pub next_value: HumanId,
}

impl From<&SequenceCounter> for CounterView {
    fn from(counter: &SequenceCounter) -> Self {
        Self {
            kind_name: counter.kind_name.clone(),
            next_value: counter.next_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Error envelope paired with its HTTP status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub body: ErrorResponse,
}

impl From<&ServiceError> for ApiError {
    fn from(err: &ServiceError) -> Self {
        let (status, errors) = match err {
            ServiceError::MissingFields(fields) => (
                400,
                fields
                    .iter()
                    .map(|field| format!("'{field}' is a required property"))
                    .collect(),
            ),
            ServiceError::InvalidInput(_) | ServiceError::RolesNotFound(_) => (400, Vec::new()),
            ServiceError::InvalidCredentials => (401, Vec::new()),
            ServiceError::NotFound { .. } => (404, Vec::new()),
            ServiceError::Conflict(_) => (409, Vec::new()),
            ServiceError::Repo(repo) if repo.is_busy() => (503, Vec::new()),
            ServiceError::PasswordHash(_) | ServiceError::Repo(_) => (500, Vec::new()),
        };
        let message = if status == 500 {
            "internal error".to_string()
        } else {
            err.to_string()
        };
        Self {
            status,
            body: ErrorResponse { message, errors },
        }
    }
}
