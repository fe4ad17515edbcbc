// Error handling framework for the refresh pipeline and its collaborators

use thiserror::Error;

/// Errors raised by one ETL cycle or by the manual refresh entry point.
///
/// Every variant is local to a single cycle of a single table. The pipeline
/// turns them into a [`crate::models::RefreshOutcome`]; none of them stop
/// the scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EtlError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Source unreachable: {0}")]
    SourceUnreachable(String),

    #[error("Source returned HTTP {status}: {body_snippet}")]
    SourceHttpError { status: u16, body_snippet: String },

    #[error("Unexpected source payload: {0}")]
    SourceShapeError(String),

    #[error("Invalid identifier '{0}' (allowed: A-Z a-z 0-9 _)")]
    InvalidIdentifier(String),

    #[error("No rows to validate")]
    EmptyInput,

    #[error("Failed to load table columns: {0}")]
    SchemaLoadError(String),

    #[error("Column {column}: {cause}")]
    CoercionError { column: String, cause: String },

    #[error("Insert failed after {inserted_before_failure} rows: {reason}")]
    CommitError {
        inserted_before_failure: usize,
        reason: String,
    },

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Metadata store error: {0}")]
    Metadata(String),
}

impl EtlError {
    /// Short stable label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::InvalidInput(_) => "invalid_input",
            EtlError::SourceUnreachable(_) => "source_unreachable",
            EtlError::SourceHttpError { .. } => "source_http_error",
            EtlError::SourceShapeError(_) => "source_shape_error",
            EtlError::InvalidIdentifier(_) => "invalid_identifier",
            EtlError::EmptyInput => "empty_input",
            EtlError::SchemaLoadError(_) => "schema_load_error",
            EtlError::CoercionError { .. } => "coercion_error",
            EtlError::CommitError { .. } => "commit_error",
            EtlError::TableNotFound(_) => "table_not_found",
            EtlError::Metadata(_) => "metadata",
        }
    }
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => DatabaseError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionFailed(err.to_string())
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(err.to_string())
    }
}

impl From<DatabaseError> for EtlError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => EtlError::TableNotFound(what),
            other => EtlError::Metadata(other.to_string()),
        }
    }
}
