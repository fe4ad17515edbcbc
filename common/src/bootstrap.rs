// Bootstrap utilities for binary initialization

use crate::config::Settings;
use crate::db::repositories::{RefreshLogRepository, TableMetadataRepository};
use crate::db::{run_migrations, DbPool};
use crate::etl::{EtlPipeline, HttpSourceFetcher, PgRowCommitter};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Initialize database pool and apply migrations
///
/// # Errors
/// Returns error if the pool cannot connect or a migration fails
#[tracing::instrument(skip(settings))]
pub async fn init_database_pool(settings: &Settings) -> Result<DbPool> {
    info!("Initializing database pool");

    let db_pool = DbPool::new(&settings.database)
        .await
        .context("Failed to initialize database pool")?;

    db_pool
        .health_check()
        .await
        .context("Database health check failed")?;

    run_migrations(&db_pool)
        .await
        .context("Failed to apply database migrations")?;

    info!("Database pool initialized");
    Ok(db_pool)
}

/// Wire the refresh pipeline over Postgres repositories and the HTTP fetcher
///
/// # Errors
/// Returns error if the HTTP client cannot be built
#[tracing::instrument(skip(settings, db_pool))]
pub fn build_pipeline(settings: &Settings, db_pool: &DbPool) -> Result<Arc<EtlPipeline>> {
    info!("Building refresh pipeline");

    let tables = Arc::new(TableMetadataRepository::new(db_pool.clone()));
    let audit = Arc::new(RefreshLogRepository::new(db_pool.clone()));
    let fetcher = Arc::new(
        HttpSourceFetcher::new(&settings.fetcher).context("Failed to build HTTP source fetcher")?,
    );
    let committer = Arc::new(PgRowCommitter::new(db_pool.clone()));

    let pipeline = EtlPipeline::new(tables.clone(), tables, audit, fetcher, committer);

    info!(
        fetch_timeout_seconds = settings.fetcher.timeout_seconds,
        "Refresh pipeline ready"
    );
    Ok(Arc::new(pipeline))
}
