// Per-cycle ETL orchestration: fetch → transform → validate → commit → report

use crate::errors::EtlError;
use crate::etl::committer::RowCommitter;
use crate::etl::fetcher::SourceFetcher;
use crate::etl::normalizer::normalize;
use crate::etl::validator::RowValidator;
use crate::metadata::{AuditLog, MetadataReader, StatusWriter};
use crate::models::{RefreshOutcome, RefreshStatus};
use crate::scheduler::RefreshRunner;
use crate::telemetry;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Stage at which a cycle failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Fetch,
    Validate,
    Commit,
}

impl PipelineStage {
    fn label(&self) -> &'static str {
        match self {
            PipelineStage::Fetch => "fetch",
            PipelineStage::Validate => "validate",
            PipelineStage::Commit => "commit",
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            PipelineStage::Fetch => "Fetch failed",
            PipelineStage::Validate => "Validation failed",
            PipelineStage::Commit => "Insert failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Runs refresh cycles for any table.
///
/// Built once and shared between the scheduler and the manual trigger.
pub struct EtlPipeline {
    metadata: Arc<dyn MetadataReader>,
    status: Arc<dyn StatusWriter>,
    audit: Arc<dyn AuditLog>,
    fetcher: Arc<dyn SourceFetcher>,
    validator: RowValidator,
    committer: Arc<dyn RowCommitter>,
}

impl EtlPipeline {
    pub fn new(
        metadata: Arc<dyn MetadataReader>,
        status: Arc<dyn StatusWriter>,
        audit: Arc<dyn AuditLog>,
        fetcher: Arc<dyn SourceFetcher>,
        committer: Arc<dyn RowCommitter>,
    ) -> Self {
        Self {
            validator: RowValidator::new(metadata.clone()),
            metadata,
            status,
            audit,
            fetcher,
            committer,
        }
    }

    /// Manual trigger: run one cycle for `table` now.
    ///
    /// Looks up the table's current source URL first. Lookup failures are
    /// returned as errors and are not written to the audit log or status;
    /// everything after the lookup is reported as a [`RefreshOutcome`].
    #[tracing::instrument(skip(self))]
    pub async fn refresh_table(&self, table: &str) -> Result<RefreshOutcome, EtlError> {
        if table.trim().is_empty() {
            return Err(EtlError::InvalidInput("table name required".to_string()));
        }

        let metadata = self
            .metadata
            .find_table(table)
            .await?
            .ok_or_else(|| EtlError::TableNotFound(table.to_string()))?;

        let url = metadata
            .data_source_url
            .ok_or_else(|| EtlError::InvalidInput(format!("table {} has no data_source_url", table)))?;

        Ok(self.run_cycle(table, &url).await)
    }

    /// Run one full cycle against `url` and report the outcome.
    #[tracing::instrument(skip(self))]
    pub async fn run_cycle(&self, table: &str, url: &str) -> RefreshOutcome {
        let started = Instant::now();
        let result = self.execute(table, url).await;
        let elapsed = started.elapsed();

        let outcome = match result {
            Ok(count) => {
                telemetry::record_refresh_success(table, count);
                RefreshOutcome {
                    table: table.to_string(),
                    status: RefreshStatus::Ok,
                    message: format!("Inserted {} rows", count),
                    rows_inserted: count,
                    duration_ms: elapsed.as_millis() as u64,
                }
            }
            Err((stage, err)) => {
                telemetry::record_refresh_failure(table, stage.label());
                tracing::debug!(table, stage = %stage, error_kind = err.kind(), "Cycle stopped");
                RefreshOutcome {
                    table: table.to_string(),
                    status: RefreshStatus::Error,
                    message: format!("{}: {}", stage.failure_prefix(), err),
                    rows_inserted: 0,
                    duration_ms: elapsed.as_millis() as u64,
                }
            }
        };
        telemetry::record_refresh_duration(table, elapsed.as_secs_f64());

        match outcome.status {
            RefreshStatus::Ok => tracing::info!(
                table,
                rows = outcome.rows_inserted,
                duration_ms = outcome.duration_ms,
                "Refresh OK: {}",
                outcome.message
            ),
            RefreshStatus::Error => tracing::warn!(
                table,
                duration_ms = outcome.duration_ms,
                "Refresh failed: {}",
                outcome.message
            ),
        }

        self.report(&outcome).await;
        outcome
    }

    async fn execute(&self, table: &str, url: &str) -> Result<usize, (PipelineStage, EtlError)> {
        let records = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|e| (PipelineStage::Fetch, e))?;

        let records = normalize(records);

        let rows = self
            .validator
            .validate(table, &records)
            .await
            .map_err(|e| (PipelineStage::Validate, e))?;

        self.committer
            .commit(table, &rows)
            .await
            .map_err(|e| (PipelineStage::Commit, e))
    }

    /// Audit append, then status upsert. Failures are logged and dropped.
    async fn report(&self, outcome: &RefreshOutcome) {
        if let Err(e) = self
            .audit
            .append(&outcome.table, outcome.status, &outcome.message)
            .await
        {
            tracing::warn!(table = %outcome.table, error = %e, "Failed to write refresh log");
        }

        let error = match outcome.status {
            RefreshStatus::Ok => None,
            RefreshStatus::Error => Some(outcome.message.clone()),
        };
        if let Err(e) = self
            .status
            .update_status(&outcome.table, outcome.status, error)
            .await
        {
            tracing::warn!(table = %outcome.table, error = %e, "Failed to update table status");
        }
    }
}

#[async_trait]
impl RefreshRunner for EtlPipeline {
    async fn refresh(&self, table: &str) {
        if let Err(e) = self.refresh_table(table).await {
            tracing::warn!(table, error = %e, "Skipping refresh cycle");
        }
    }
}
