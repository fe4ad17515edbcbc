// Per-table refresh task

use crate::models::JobSpec;
use crate::scheduler::engine::RefreshRunner;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Lifecycle of one per-table task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Starting,
    Active,
    Cancelling,
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Starting => "starting",
            JobState::Active => "active",
            JobState::Cancelling => "cancelling",
            JobState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// A tracked table's live task
pub struct JobEntry {
    pub interval_seconds: u64,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<()>,
}

impl JobEntry {
    /// Spawn the refresh task for `spec`.
    ///
    /// When `previous` is given (an interval change), the new task waits for
    /// the old one to finish before arming its timer, so two tasks never run
    /// cycles for the same table at once.
    pub fn spawn(
        spec: &JobSpec,
        runner: Arc<dyn RefreshRunner>,
        cancel: CancellationToken,
        previous: Option<JoinHandle<()>>,
    ) -> Self {
        let table = spec.table_name.clone();
        let period = spec.interval();
        let task_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            debug!(table = %table, state = %JobState::Starting, "Refresh task spawned");
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    tracing::error!(table = %table, error = %e, "Previous refresh task ended abnormally");
                }
            }
            run(table, period, runner, task_cancel).await;
        });

        Self {
            interval_seconds: spec.interval_seconds,
            cancel,
            handle,
        }
    }

    /// Request cancellation. Idempotent; an in-flight cycle runs to completion.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

async fn run(
    table: String,
    period: Duration,
    runner: Arc<dyn RefreshRunner>,
    cancel: CancellationToken,
) {
    info!(
        table = %table,
        interval_seconds = period.as_secs(),
        state = %JobState::Active,
        "Started refresh job"
    );

    loop {
        // The timer is re-armed only after the previous cycle finished
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }
        if cancel.is_cancelled() {
            break;
        }

        runner.refresh(&table).await;
    }

    debug!(table = %table, state = %JobState::Cancelling, "Refresh job observed cancellation");
    info!(table = %table, state = %JobState::Stopped, "Stopped refresh job");
}
