// Row validation: filter normalized records against a table's column catalog

use crate::errors::EtlError;
use crate::etl::coercion::coerce;
use crate::metadata::MetadataReader;
use crate::models::{ColumnValue, Record, ValidatedRow};
use regex::Regex;
use std::sync::{Arc, OnceLock};

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("identifier pattern is valid"))
}

/// Reject anything but letters, digits and underscore.
///
/// Table names are interpolated into SQL, so this is the only thing standing
/// between a table name and the statement text.
pub fn validate_identifier(name: &str) -> Result<(), EtlError> {
    if identifier_pattern().is_match(name) {
        Ok(())
    } else {
        Err(EtlError::InvalidIdentifier(name.to_string()))
    }
}

/// Converts normalized records into store-ready rows for one table
pub struct RowValidator {
    catalog: Arc<dyn MetadataReader>,
}

impl RowValidator {
    pub fn new(catalog: Arc<dyn MetadataReader>) -> Self {
        Self { catalog }
    }

    /// Validate and coerce records for `table`.
    ///
    /// Unknown fields are dropped; records with no known field are dropped.
    /// Output columns follow the catalog's ordinal order.
    #[tracing::instrument(skip(self, records), fields(records = records.len()))]
    pub async fn validate(
        &self,
        table: &str,
        records: &[Record],
    ) -> Result<Vec<ValidatedRow>, EtlError> {
        validate_identifier(table)?;
        if records.is_empty() {
            return Err(EtlError::EmptyInput);
        }

        let catalog = self
            .catalog
            .column_catalog(table)
            .await
            .map_err(|e| EtlError::SchemaLoadError(e.to_string()))?;

        if catalog.is_empty() {
            return Err(EtlError::SchemaLoadError(format!(
                "table {} has no columns",
                table
            )));
        }

        tracing::debug!(columns = catalog.len(), "Loaded column catalog for validation");

        let mut rows = Vec::with_capacity(records.len());
        let mut dropped = 0usize;

        for record in records {
            let mut row = ValidatedRow::default();

            for column in catalog.iter() {
                let Some(raw) = record.get(&column.column_name) else {
                    continue;
                };

                let value = coerce(column.family(), raw).map_err(|e| match e {
                    EtlError::CoercionError { cause, .. } => EtlError::CoercionError {
                        column: column.column_name.clone(),
                        cause,
                    },
                    other => other,
                })?;

                row.columns.push(ColumnValue {
                    column: column.column_name.clone(),
                    udt_name: column.udt_name.clone(),
                    value,
                });
            }

            if row.is_empty() {
                dropped += 1;
                continue;
            }
            rows.push(row);
        }

        if dropped > 0 {
            tracing::debug!(dropped, "Dropped records with no known columns");
        }

        Ok(rows)
    }
}
