// Collaborator interfaces the refresh core needs from the metadata store
// and the audit log. Postgres implementations live in db::repositories.

use crate::errors::DatabaseError;
use crate::models::{ColumnCatalog, RefreshLogEntry, RefreshStatus, TableMetadata};
use async_trait::async_trait;

/// Read access to table metadata and column catalogs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetadataReader: Send + Sync {
    /// All registered tables, eligible for periodic refresh or not
    async fn list_tables(&self) -> Result<Vec<TableMetadata>, DatabaseError>;

    /// One table's metadata, `None` if it is not registered
    async fn find_table(&self, table_name: &str) -> Result<Option<TableMetadata>, DatabaseError>;

    /// Ordered column catalog of a destination table. Empty if the table does not exist.
    async fn column_catalog(&self, table_name: &str) -> Result<ColumnCatalog, DatabaseError>;
}

/// Write access to a table's current refresh status
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// OK stamps the success time and clears the last error.
    /// ERROR sets the last error and leaves the success time untouched.
    async fn update_status(
        &self,
        table_name: &str,
        status: RefreshStatus,
        error: Option<String>,
    ) -> Result<(), DatabaseError>;
}

/// Append-only refresh audit log
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(
        &self,
        table_name: &str,
        status: RefreshStatus,
        message: &str,
    ) -> Result<(), DatabaseError>;

    /// Most recent entries for a table, newest first
    async fn recent(
        &self,
        table_name: &str,
        limit: i64,
    ) -> Result<Vec<RefreshLogEntry>, DatabaseError>;
}
