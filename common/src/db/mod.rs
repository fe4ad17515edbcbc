// Database layer module

pub mod pool;
pub mod repositories;

pub use pool::DbPool;

use crate::errors::DatabaseError;
use tracing::{info, instrument};

/// Apply the bundled schema migrations (`table_metadata`, `refresh_logs`)
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &DbPool) -> Result<(), DatabaseError> {
    sqlx::migrate!("../migrations").run(pool.pool()).await?;
    info!("Database migrations applied");
    Ok(())
}
