//! `rotaguard`: operator CLI over the RotaGuard core.
//!
//! Opens the configured SQLite store, runs one use-case and prints the
//! result as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rotaguard_core::api::{CounterView, MessageResponse, RoleView, TeamView, UserView};
use rotaguard_core::{
    list_counters, peek_next_value, AuthService, CoreConfig, EntityKind, NewTeam, RoleService,
    SequenceCounter, SqliteRoleRepository, SqliteTeamRepository, SqliteUserRepository,
    TeamService, UserService,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "rotaguard", about = "Role and team management for shift rotas")]
struct Cli {
    /// SQLite database file. Overrides ROTAGUARD_DATABASE.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// How long a write waits on another writer before failing.
    /// Overrides ROTAGUARD_BUSY_TIMEOUT_MS.
    #[arg(long, global = true)]
    busy_timeout_ms: Option<u64>,

    /// trace|debug|info|warn|error. Overrides ROTAGUARD_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Overrides ROTAGUARD_LOG_DIR;
    /// logging is off when neither is set.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the default scheduling roles that are missing.
    SeedRoles,
    /// List roles in creation order.
    Roles,
    /// Create one role.
    CreateRole { name: String },
    /// List users.
    Users,
    /// Register an account with the manager role.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// List teams with their members.
    Teams,
    /// Create an empty team.
    CreateTeam { name: String },
    /// Show the per-kind human ID counters.
    Counters {
        /// Only this kind, e.g. `user` or `team_membership`.
        #[arg(long)]
        kind: Option<String>,
    },
    /// Show version.
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli, CoreConfig::from_env()?);
    config
        .init_logging()
        .context("failed to start logging")?;

    if let Commands::Version = cli.command {
        return print_json(&MessageResponse::new(format!(
            "rotaguard {}",
            rotaguard_core::core_version()
        )));
    }

    let mut conn = config
        .open_db()
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Commands::SeedRoles => {
            let created = RoleService::new(SqliteRoleRepository::new(&mut conn))
                .seed_default_roles()?;
            print_json(&MessageResponse::new(format!(
                "created {} default roles",
                created.len()
            )))
        }
        Commands::Roles => {
            let roles = RoleService::new(SqliteRoleRepository::new(&mut conn)).list_roles()?;
            print_json(&roles.iter().map(RoleView::from).collect::<Vec<_>>())
        }
        Commands::CreateRole { name } => {
            let role =
                RoleService::new(SqliteRoleRepository::new(&mut conn)).create_role(&name, None)?;
            print_json(&RoleView::from(&role))
        }
        Commands::Users => {
            let users = UserService::new(SqliteUserRepository::new(&mut conn)).list_users()?;
            print_json(&users.iter().map(UserView::from).collect::<Vec<_>>())
        }
        Commands::Register {
            email,
            password,
            name,
        } => {
            let registration = AuthService::new(SqliteUserRepository::new(&mut conn))
                .register(&email, &password, &name)?;
            print_json(&UserView::from(&registration.user))
        }
        Commands::Teams => {
            let teams = TeamService::new(SqliteTeamRepository::new(&mut conn)).list_teams()?;
            print_json(&teams.iter().map(TeamView::from).collect::<Vec<_>>())
        }
        Commands::CreateTeam { name } => {
            let team = TeamService::new(SqliteTeamRepository::new(&mut conn)).create_team(
                NewTeam {
                    name,
                    ..NewTeam::default()
                },
            )?;
            print_json(&TeamView::from(&team))
        }
        Commands::Counters { kind } => {
            let counters = match kind {
                None => list_counters(&conn)?,
                Some(name) => {
                    let Some(kind) = EntityKind::parse(name.trim()) else {
                        bail!("unknown kind `{name}`");
                    };
                    peek_next_value(&conn, kind.as_str())?
                        .map(|next_value| SequenceCounter {
                            kind_name: kind.as_str().to_string(),
                            next_value,
                        })
                        .into_iter()
                        .collect()
                }
            };
            print_json(&counters.iter().map(CounterView::from).collect::<Vec<_>>())
        }
        Commands::Version => Ok(()),
    }
}

/// Command-line flags win over the environment-derived `config`.
fn build_config(cli: &Cli, mut config: CoreConfig) -> CoreConfig {
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(millis) = cli.busy_timeout_ms {
        config.busy_timeout = Duration::from_millis(millis);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "rotaguard",
            "--db",
            "/tmp/rota.db",
            "--busy-timeout-ms",
            "250",
            "roles",
        ])
        .unwrap();
        let env = CoreConfig {
            log_level: "warn".to_string(),
            ..CoreConfig::default()
        };
        let config = build_config(&cli, env);
        assert_eq!(config.db_path, PathBuf::from("/tmp/rota.db"));
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn counters_accepts_an_optional_kind() {
        let cli = Cli::try_parse_from(["rotaguard", "counters", "--kind", "team"]).unwrap();
        assert!(matches!(cli.command, Commands::Counters { kind: Some(ref k) } if k == "team"));
    }
}
