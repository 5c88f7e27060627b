// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator command line for the quarters housing workflow.
//!
//! Opens the database (running pending migrations), builds an engine from
//! the optional configuration and capability table files, and runs one
//! administrative command.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{
    Result,
    eyre::{Context, bail},
};
use quarters::{CapabilityAuthorizer, CapabilityTable};
use quarters_audit::TracingAuditSink;
use quarters_domain::{
    District, DocumentId, Role, UnitKind, UserId, format_date, parse_date,
};
use quarters_engine::{AuthenticatedActor, Engine, EngineConfig};
use quarters_persistence::Persistence;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::{Date, OffsetDateTime};
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_log::AsTrace;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let filter = EnvFilter::builder()
        .with_default_directive(args.log_level().into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            error!("{err:#}");
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Quarters administration.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses an
    /// in-memory database.
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// JSON file overriding engine settings.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON capability table replacing the built-in one.
    #[arg(short, long)]
    permissions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Apply pending migrations and check foreign key enforcement
    Migrate,

    /// Scan all users and units for occupancy inconsistencies
    Verify,

    /// List occupied units due a vacate reminder
    Reminders {
        /// User id of the operator marking reminders
        #[arg(long)]
        actor: i64,

        /// Reference date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<String>,

        /// Mark every listed unit as reminded
        #[arg(long)]
        mark: bool,
    },

    /// Print a document as JSON
    Show {
        /// The document id
        document_id: i64,

        /// User id of the reader
        #[arg(long)]
        actor: i64,
    },

    /// Register a user with no tenure
    ///
    /// On an empty database the first user may be registered without an
    /// actor.
    RegisterUser {
        /// Display name
        name: String,

        /// User id of the administrator registering the user
        #[arg(long)]
        actor: Option<i64>,

        /// Role, e.g. `applicant` or `inspector`
        #[arg(long)]
        role: String,

        /// District, required for inspectors and district chiefs
        #[arg(long)]
        district: Option<String>,
    },

    /// Register an available unit
    RegisterUnit {
        /// `housing` or `lodging`
        kind: String,

        /// User id of the administrator registering the unit
        #[arg(long)]
        actor: i64,

        /// Unit code, unique within its kind
        code: String,

        /// District the unit belongs to
        #[arg(long)]
        district: String,

        /// Free-text description
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Deactivate a user
    Deactivate {
        /// The user id
        user_id: i64,

        /// User id of the administrator deactivating the user
        #[arg(long)]
        actor: i64,
    },
}

impl Args {
    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }

    fn run(self) -> Result<()> {
        let config: EngineConfig = match &self.config {
            Some(path) => EngineConfig::from_json(&read(path)?)
                .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?,
            None => EngineConfig::default(),
        };
        let authorizer: CapabilityAuthorizer = match &self.permissions {
            Some(path) => {
                let table = CapabilityTable::from_json(&read(path)?)
                    .wrap_err_with(|| format!("invalid capability table in {}", path.display()))?;
                info!(path = %path.display(), "Loaded capability table");
                CapabilityAuthorizer::new(table)
            }
            None => CapabilityAuthorizer::builtin(),
        };

        let persistence: Persistence = match &self.database {
            Some(path) => {
                info!(path = %path.display(), "Using file-based database");
                Persistence::new_with_file(path, config.busy_timeout_ms)?
            }
            None => {
                warn!("No database given; using an empty in-memory database");
                Persistence::new_in_memory()?
            }
        };
        let engine = Engine::new(persistence, authorizer, Arc::new(TracingAuditSink), config);

        self.command.run(&engine)
    }
}

impl Command {
    fn run(self, engine: &Engine) -> Result<()> {
        match self {
            Self::Migrate => {
                engine.verify_storage()?;
                info!("Database is migrated");
            }
            Self::Verify => {
                let report = engine.verify_consistency()?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                if !report.is_consistent() {
                    bail!(
                        "{} consistency violation(s) found",
                        report.violations.len()
                    );
                }
            }
            Self::Reminders { actor, today, mark } => {
                let today: Date = match today {
                    Some(text) => parse_date(&text)?,
                    None => OffsetDateTime::now_utc().date(),
                };
                let actor: AuthenticatedActor = resolve_actor(engine, actor)?;
                reminders(engine, &actor, today, mark)?;
            }
            Self::Show { document_id, actor } => {
                let actor: AuthenticatedActor = resolve_actor(engine, actor)?;
                let document = engine.get(DocumentId::new(document_id), &actor)?;
                println!("{}", serde_json::to_string_pretty(&document)?);
            }
            Self::RegisterUser {
                name,
                actor,
                role,
                district,
            } => {
                let role: Role = role.parse()?;
                let district: Option<District> = district.as_deref().map(District::new);
                let user = match actor {
                    Some(actor) => {
                        let actor: AuthenticatedActor = resolve_actor(engine, actor)?;
                        engine.register_user(&actor, &name, role, district.as_ref())?
                    }
                    None => engine
                        .bootstrap_first_user(&name, role, district.as_ref())
                        .wrap_err("only the first user may be registered without --actor")?,
                };
                println!("{}", user.id);
            }
            Self::RegisterUnit {
                kind,
                actor,
                code,
                district,
                description,
            } => {
                let kind: UnitKind = kind.parse()?;
                let actor: AuthenticatedActor = resolve_actor(engine, actor)?;
                let unit = engine.register_unit(
                    &actor,
                    kind,
                    &code,
                    &District::new(&district),
                    &description,
                )?;
                println!("{}", unit.id);
            }
            Self::Deactivate { user_id, actor } => {
                let actor: AuthenticatedActor = resolve_actor(engine, actor)?;
                let deactivated = engine.deactivate_user(&actor, UserId::new(user_id))?;
                let Some(user) = deactivated else {
                    info!(user_id, "User was already inactive");
                    return Ok(());
                };
                info!(user_id = user.id.value(), "Deactivated user");
            }
        }
        Ok(())
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("cannot read {}", path.display()))
}

/// The CLI is run by a trusted operator; the actor acts in their stored role.
fn resolve_actor(engine: &Engine, user_id: i64) -> Result<AuthenticatedActor> {
    let user = engine.load_user(UserId::new(user_id))?;
    Ok(AuthenticatedActor::new(user.id, user.role))
}

fn reminders(engine: &Engine, actor: &AuthenticatedActor, today: Date, mark: bool) -> Result<()> {
    let due = engine.units_due_for_reminder(today)?;
    info!(today = %format_date(today), due = due.len(), "Units due for a vacate reminder");

    for unit in &due {
        let Some(occupancy) = unit.occupancy.current() else {
            continue;
        };
        let expected: String = occupancy
            .expected_vacate_on
            .map_or_else(|| String::from("-"), format_date);
        println!(
            "{}\t{}\t{}\t{}",
            unit.kind, unit.code, occupancy.occupant, expected
        );
        if mark {
            engine.mark_reminder_sent(unit.id, actor)?;
        }
    }
    Ok(())
}
