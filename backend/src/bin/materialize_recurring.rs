//! Materialise one recurring appointment template over a date window.
//!
//! Reruns over the same window create nothing new, so the command is safe to
//! schedule repeatedly.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use carerota::config::SchedulingSettings;
use carerota::domain::ports::{
    FixtureTenantDirectory, GenerateInstancesRequest, RecurringAppointmentCommand,
};
use carerota::domain::{
    Actor, OrganizationId, RecurringAppointmentService, Role, RoleCapabilityCheck, TemplateId,
    UserId,
};
use carerota::outbound::persistence::migrations::run_pending_migrations;
use carerota::outbound::persistence::{DbPool, DieselAppointmentRepository, PoolConfig};
use chrono::NaiveDate;
use clap::Parser;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

/// `materialize-recurring` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "materialize-recurring",
    about = "Generate appointments from a recurring template over an inclusive date window",
    version
)]
struct CliArgs {
    /// Template to materialise.
    #[arg(long = "template-id", value_name = "uuid")]
    template_id: Uuid,
    /// Organization owning the template.
    #[arg(long = "organization-id", value_name = "uuid")]
    organization_id: Uuid,
    /// First date of the window, `YYYY-MM-DD`.
    #[arg(long = "window-start", value_name = "date")]
    window_start: NaiveDate,
    /// Last date of the window, `YYYY-MM-DD`.
    #[arg(long = "window-end", value_name = "date")]
    window_end: NaiveDate,
    /// Database connection URL. Falls back to configuration, then `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Run pending schema migrations before generating.
    #[arg(long = "apply-migrations")]
    apply_migrations: bool,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = SchedulingSettings::load_from_iter([OsString::from("materialize-recurring")])
        .map_err(|error| io::Error::other(format!("load configuration: {error}")))?;
    let policy = settings
        .policy()
        .map_err(|error| io::Error::other(format!("invalid configuration: {error}")))?;

    let pool_config = resolve_pool_config(args.database_url.as_deref(), &settings)?;
    if args.apply_migrations {
        let database_url = pool_config.database_url().to_owned();
        let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&database_url))
            .await
            .map_err(|error| io::Error::other(format!("migration task failed: {error}")))?
            .map_err(io::Error::other)?;
        info!(applied, "schema migrations checked");
    }

    let pool = DbPool::new(pool_config)
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let actor = Actor::new(
        UserId::from_uuid(Uuid::nil()),
        OrganizationId::from_uuid(args.organization_id),
    );
    let access = RoleCapabilityCheck::new().with_role(actor.user_id, Role::Administrator);
    let command = RecurringAppointmentService::new(
        Arc::new(DieselAppointmentRepository::new(pool)),
        Arc::new(FixtureTenantDirectory),
        Arc::new(access),
        policy.generation_safety_cap,
    );

    let created = command
        .generate_recurring_instances(GenerateInstancesRequest {
            actor,
            template_id: TemplateId::from_uuid(args.template_id),
            window_start: args.window_start,
            window_end: args.window_end,
        })
        .await
        .map_err(|error| io::Error::other(format!("generation failed: {error}")))?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "created={}", created.len())?;
    for appointment in &created {
        writeln!(
            stdout,
            "appointment={} start={}",
            appointment.id(),
            appointment.start()
        )?;
    }
    Ok(())
}

fn resolve_pool_config(
    cli_url: Option<&str>,
    settings: &SchedulingSettings,
) -> io::Result<PoolConfig> {
    if let Some(url) = cli_url {
        return Ok(PoolConfig::new(url));
    }
    if let Some(config) = settings.pool_config() {
        return Ok(config);
    }
    env::var("DATABASE_URL")
        .map(PoolConfig::new)
        .map_err(|_| {
            io::Error::other("no database URL: pass --database-url or set DATABASE_URL")
        })
}
