//! # SIPSA Ingestion Service Main Entry Point

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use sipsa_ingest::{
    config::ConfigLoader,
    db, logging,
    ingestion::{methods, IngestionJob, IngestionScheduler, WindowPolicy},
    server::{run_server, AppState},
    soap::SoapClient,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "sipsa-ingest")]
#[command(about = "SIPSA ingestion service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = Arc::new(config_loader.load()?);

    logging::init_subscriber(&config);

    // Initialize database connection
    let db = db::init_pool(&config).await?;

    // Handle CLI commands
    if let Some(command) = cli.command {
        match command {
            Commands::Migrate { action } => {
                handle_migrate_command(&db, action).await?;
                return Ok(());
            }
        }
    }

    // Run migrations automatically for local and test profiles
    if config.profile == "local" || config.profile == "test" {
        info!(profile = %config.profile, "Running migrations automatically");
        Migrator::up(&db, None).await?;
        info!("Migrations completed successfully");
    }

    // Wire the SOAP source, method registry, and orchestrator
    let soap_client = Arc::new(SoapClient::new(config.soap.clone())?);
    let registry = methods::build_registry(&db, soap_client, &config);
    info!(handlers = registry.len(), "Initialized ingestion method registry");

    let window_policy = WindowPolicy::from_config(&config)?;
    let job = Arc::new(IngestionJob::new(
        db.clone(),
        registry,
        window_policy,
        config.ingestion.max_reject_rate,
        config.ingestion.max_reject_count,
    ));

    // Start the cron scheduler; the handle must stay alive with the server
    let scheduler = IngestionScheduler::new(job.clone(), config.clone());
    let _scheduler_handle = scheduler.start().await?;

    if let Ok(redacted_json) = config.redacted_json() {
        info!(config = %redacted_json, "Loaded configuration");
    }

    let state = AppState {
        db,
        config: config.clone(),
        job,
    };
    run_server(config, state).await
}

async fn handle_migrate_command(
    db: &DatabaseConnection,
    action: MigrateAction,
) -> anyhow::Result<()> {
    match action {
        MigrateAction::Up => {
            println!("Applying migrations...");
            Migrator::up(db, None).await?;
            println!("All migrations applied successfully");
        }
        MigrateAction::Down => {
            println!("Rolling back last migration...");
            Migrator::down(db, Some(1)).await?;
            println!("Migration rolled back successfully");
        }
        MigrateAction::Status => {
            println!("Checking migration status...");
            let applied = Migrator::get_applied_migrations(db).await?;
            let pending = Migrator::get_pending_migrations(db).await?;

            if applied.is_empty() {
                println!("No migrations have been applied");
            } else {
                println!("Applied migrations: {} migration(s)", applied.len());
            }

            if pending.is_empty() {
                println!("No pending migrations");
            } else {
                println!("Pending migrations: {} migration(s)", pending.len());
            }
        }
    }
    Ok(())
}
