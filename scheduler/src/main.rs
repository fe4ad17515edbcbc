// Scheduler binary entry point

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use common::bootstrap;
use common::config::Settings;
use common::db::repositories::{RefreshLogRepository, TableMetadataRepository};
use common::db::DbPool;
use common::metadata::AuditLog;
use common::scheduler::{Scheduler, SchedulerConfig, SchedulerEngine};
use common::telemetry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load_from_path(&cli.config_dir).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            cli.config_dir.display()
        )
    })?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;

    info!(
        config_dir = %cli.config_dir.display(),
        reconcile_interval_seconds = settings.scheduler.reconcile_interval_seconds,
        "Configuration loaded"
    );

    let db_pool = bootstrap::init_database_pool(&settings).await?;

    let result = match cli.command() {
        Commands::Run => run_scheduler(&settings, &db_pool).await,
        Commands::Refresh { table } => refresh_once(&settings, &db_pool, table).await,
        Commands::Logs { table, limit } => print_logs(&db_pool, table, *limit).await,
    };

    db_pool.close().await;
    if settings.observability.tracing_endpoint.is_some() {
        telemetry::shutdown_tracer();
    }

    result
}

async fn run_scheduler(settings: &Settings, db_pool: &DbPool) -> Result<()> {
    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port)?;
    }

    let pipeline = bootstrap::build_pipeline(settings, db_pool)?;
    let metadata = Arc::new(TableMetadataRepository::new(db_pool.clone()));

    let scheduler_config = SchedulerConfig {
        reconcile_interval_seconds: settings.scheduler.reconcile_interval_seconds,
    };

    let shutdown = CancellationToken::new();
    let scheduler = Arc::new(SchedulerEngine::new(
        scheduler_config,
        metadata,
        pipeline,
        shutdown.child_token(),
    ));
    info!("Scheduler engine created");

    let scheduler_for_shutdown = scheduler.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal, initiating graceful shutdown"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
        }
        if let Err(e) = scheduler_for_shutdown.stop().await {
            error!(error = %e, "Error during scheduler shutdown");
        }
    });

    info!("Starting reconciliation loop");
    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Scheduler error: {}", e))?;

    info!("Scheduler stopped");
    Ok(())
}

async fn refresh_once(settings: &Settings, db_pool: &DbPool, table: &str) -> Result<()> {
    let pipeline = bootstrap::build_pipeline(settings, db_pool)?;

    let outcome = pipeline
        .refresh_table(table)
        .await
        .with_context(|| format!("Refresh of {} could not start", table))?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    if !outcome.is_ok() {
        anyhow::bail!("Refresh of {} failed: {}", table, outcome.message);
    }
    Ok(())
}

async fn print_logs(db_pool: &DbPool, table: &str, limit: i64) -> Result<()> {
    let audit = RefreshLogRepository::new(db_pool.clone());
    let entries = audit
        .recent(table, limit)
        .await
        .with_context(|| format!("Failed to read refresh logs for {}", table))?;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
