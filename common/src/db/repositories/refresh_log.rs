// Refresh audit log repository

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::metadata::AuditLog;
use crate::models::{RefreshLogEntry, RefreshStatus};
use async_trait::async_trait;
use tracing::instrument;

/// Default number of entries returned by a log listing
pub const DEFAULT_LOG_LIMIT: i64 = 100;

/// Append-only repository over `refresh_logs`
#[derive(Clone)]
pub struct RefreshLogRepository {
    pool: DbPool,
}

impl RefreshLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for RefreshLogRepository {
    #[instrument(skip(self, message))]
    async fn append(
        &self,
        table_name: &str,
        status: RefreshStatus,
        message: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_logs (table_name, status, message, created_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(table_name)
        .bind(status.as_str())
        .bind(message)
        .execute(self.pool.pool())
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent(
        &self,
        table_name: &str,
        limit: i64,
    ) -> Result<Vec<RefreshLogEntry>, DatabaseError> {
        let limit = if limit > 0 { limit } else { DEFAULT_LOG_LIMIT };

        let entries = sqlx::query_as::<_, RefreshLogEntry>(
            r#"
            SELECT id, table_name, status, message, created_at
            FROM refresh_logs
            WHERE table_name = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(table_name)
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await?;

        Ok(entries)
    }
}
