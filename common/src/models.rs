use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::time::Duration;

/// Table type tag marking a table for periodic refresh
pub const TIME_SERIES_TABLE_TYPE: &str = "time_series";

/// One decoded source record: field name → raw JSON value
pub type Record = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Table Metadata Models
// ============================================================================

/// A row of `table_metadata`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TableMetadata {
    pub table_name: String,
    pub table_type: String,
    pub refresh_interval: Option<i32>,
    pub data_source_url: Option<String>,
    pub status: Option<String>,
    pub last_refresh_success: Option<DateTime<Utc>>,
    pub last_refresh_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableMetadata {
    /// The job spec for this table, if it is eligible for periodic refresh.
    ///
    /// Eligible means: `time_series` type, a positive interval and a
    /// non-empty source URL.
    pub fn job_spec(&self) -> Option<JobSpec> {
        if self.table_type != TIME_SERIES_TABLE_TYPE {
            return None;
        }
        let interval = self.refresh_interval.filter(|i| *i > 0)?;
        let url = self
            .data_source_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())?;

        Some(JobSpec {
            table_name: self.table_name.clone(),
            interval_seconds: interval as u64,
            source_url: url.to_string(),
        })
    }
}

/// Desired periodic refresh job for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub table_name: String,
    pub interval_seconds: u64,
    pub source_url: String,
}

impl JobSpec {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

// ============================================================================
// Column Catalog Models
// ============================================================================

/// Coarse type family of a destination column, derived from its declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFamily {
    Integer,
    Float,
    Boolean,
    Timestamp,
    Text,
}

impl TypeFamily {
    /// Classify a declared data type such as `integer`, `double precision`
    /// or `timestamp with time zone`.
    pub fn classify(data_type: &str) -> Self {
        let data_type = data_type.to_lowercase();

        if data_type.contains("timestamp") || data_type.contains("date") {
            TypeFamily::Timestamp
        } else if data_type.contains("int") {
            TypeFamily::Integer
        } else if ["double", "numeric", "real", "float", "decimal"]
            .iter()
            .any(|t| data_type.contains(t))
        {
            TypeFamily::Float
        } else if data_type.contains("bool") {
            TypeFamily::Boolean
        } else {
            TypeFamily::Text
        }
    }
}

/// One destination column as reported by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    /// Store-level type name (`int4`, `timestamptz`, ...) used to cast bound values
    pub udt_name: String,
}

impl ColumnInfo {
    pub fn new(
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        udt_name: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            data_type: data_type.into().to_lowercase(),
            udt_name: udt_name.into(),
        }
    }

    pub fn family(&self) -> TypeFamily {
        TypeFamily::classify(&self.data_type)
    }
}

/// Ordered column catalog of one destination table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCatalog {
    columns: Vec<ColumnInfo>,
}

impl ColumnCatalog {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self { columns }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, column_name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.column_name == column_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter()
    }
}

// ============================================================================
// Row Models
// ============================================================================

/// Store-ready value produced by coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
}

impl StoreValue {
    pub fn text(value: impl Into<String>) -> Self {
        StoreValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StoreValue::Null)
    }
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreValue::Null => write!(f, "NULL"),
            StoreValue::Integer(i) => write!(f, "{}", i),
            StoreValue::Float(v) => write!(f, "{}", v),
            StoreValue::Boolean(b) => write!(f, "{}", b),
            StoreValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One column of a validated row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnValue {
    pub column: String,
    pub udt_name: String,
    pub value: StoreValue,
}

/// A validated row, columns in catalog order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub columns: Vec<ColumnValue>,
}

impl ValidatedRow {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, column: &str) -> Option<&StoreValue> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.value)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.as_str()).collect()
    }
}

// ============================================================================
// Refresh Outcome Models
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RefreshStatus {
    Ok,
    Error,
}

impl RefreshStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStatus::Ok => "OK",
            RefreshStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for RefreshStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RefreshStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(RefreshStatus::Ok),
            "ERROR" => Ok(RefreshStatus::Error),
            other => Err(format!("unknown refresh status: {}", other)),
        }
    }
}

/// Result of one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshOutcome {
    pub table: String,
    pub status: RefreshStatus,
    pub message: String,
    pub rows_inserted: usize,
    pub duration_ms: u64,
}

impl RefreshOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == RefreshStatus::Ok
    }
}

/// One append-only entry of `refresh_logs`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshLogEntry {
    pub id: i64,
    pub table_name: String,
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
