//! Core domain logic for RotaGuard role and team management.
//! This crate is the single source of truth for business invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sequence;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, logging_status, try_init_logging, LoggingError};
pub use model::entity::{Entity, EntityId, EntityKind, EntityMeta, HumanId};
pub use model::role::{Role, RoleId, UserRole};
pub use model::team::{Team, TeamId, TeamMembership};
pub use model::user::{User, UserId};
pub use model::ValidationError;
pub use repo::role_repo::{RoleRepository, SqliteRoleRepository};
pub use repo::team_repo::{
    NewTeam, NewTeamMember, SqliteTeamRepository, TeamDetail, TeamPatch, TeamRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use sequence::{
    allocate_human_id, assign_human_id, list_counters, next_human_id, peek_next_value,
    SequenceCounter, SequenceError, SequenceResult,
};
pub use service::auth_service::{AuthService, Registration};
pub use service::role_service::RoleService;
pub use service::team_service::TeamService;
pub use service::user_service::UserService;
pub use service::{ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
