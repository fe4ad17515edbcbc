// Scheduler engine: periodic reconciliation of desired jobs against live tasks

use crate::errors::DatabaseError;
use crate::metadata::MetadataReader;
use crate::models::JobSpec;
use crate::scheduler::job::JobEntry;
use crate::telemetry;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often desired jobs are re-read and reconciled (in seconds)
    pub reconcile_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_seconds: 30,
        }
    }
}

/// "Run one refresh cycle for table X", to completion
#[async_trait]
pub trait RefreshRunner: Send + Sync {
    async fn refresh(&self, table: &str);
}

/// Scheduler trait for the reconciliation controller
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Run the reconciliation loop until stopped. No-op if already running.
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Stop the controller and wait until every task has exited
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Converge live tasks to the current set of eligible job specs
    async fn reconcile(&self) -> Result<ReconcileSummary, DatabaseError>;
}

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// What one reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub started: Vec<String>,
    pub restarted: Vec<String>,
    pub stopped: Vec<String>,
}

impl ReconcileSummary {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.restarted.is_empty() && self.stopped.is_empty()
    }
}

#[derive(Default)]
struct JobRegistry {
    active: HashMap<String, JobEntry>,
    /// Cancelled tasks that may still be finishing a cycle
    draining: Vec<JoinHandle<()>>,
}

/// Reconciling scheduler over per-table refresh tasks
pub struct SchedulerEngine {
    config: SchedulerConfig,
    metadata: Arc<dyn MetadataReader>,
    runner: Arc<dyn RefreshRunner>,
    jobs: Mutex<JobRegistry>,
    state: watch::Sender<ControllerState>,
    shutdown: CancellationToken,
}

impl SchedulerEngine {
    /// Create a new scheduler engine.
    ///
    /// Cancelling `shutdown` (or any parent it was derived from) stops the
    /// controller like [`Scheduler::stop`].
    pub fn new(
        config: SchedulerConfig,
        metadata: Arc<dyn MetadataReader>,
        runner: Arc<dyn RefreshRunner>,
        shutdown: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(ControllerState::Idle);
        Self {
            config,
            metadata,
            runner,
            jobs: Mutex::new(JobRegistry::default()),
            state,
            shutdown,
        }
    }

    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }

    /// Tracked tables and their intervals, sorted by table name
    pub async fn tracked_jobs(&self) -> Vec<(String, u64)> {
        let jobs = self.jobs.lock().await;
        let mut tracked: Vec<_> = jobs
            .active
            .iter()
            .map(|(table, entry)| (table.clone(), entry.interval_seconds))
            .collect();
        tracked.sort();
        tracked
    }

    async fn desired_specs(&self) -> Result<BTreeMap<String, JobSpec>, DatabaseError> {
        let tables = self.metadata.list_tables().await?;
        Ok(tables
            .iter()
            .filter_map(|t| t.job_spec())
            .map(|spec| (spec.table_name.clone(), spec))
            .collect())
    }

    fn spawn_entry(&self, spec: &JobSpec, previous: Option<JoinHandle<()>>) -> JobEntry {
        JobEntry::spawn(
            spec,
            self.runner.clone(),
            self.shutdown.child_token(),
            previous,
        )
    }

    /// Cancel every task and wait for all of them to exit
    async fn stop_all_jobs(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut jobs = self.jobs.lock().await;
            info!(jobs = jobs.active.len(), "Stopping all refresh jobs");

            let mut handles: Vec<_> = jobs
                .active
                .drain()
                .map(|(_, entry)| {
                    entry.cancel();
                    entry.handle
                })
                .collect();
            handles.append(&mut jobs.draining);
            handles
        };

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(error = %e, "Refresh task ended abnormally");
            }
        }

        telemetry::update_active_jobs(0);
        info!("All refresh jobs stopped");
    }
}

#[async_trait]
impl Scheduler for SchedulerEngine {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if *state == ControllerState::Idle {
                *state = ControllerState::Running;
                claimed = true;
                true
            } else {
                false
            }
        });
        if !claimed {
            info!(state = ?self.state(), "Scheduler already started, ignoring start");
            return Ok(());
        }

        info!(
            reconcile_interval_seconds = self.config.reconcile_interval_seconds,
            "Starting refresh scheduler"
        );

        let mut ticker = interval(Duration::from_secs(self.config.reconcile_interval_seconds));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    match self.reconcile().await {
                        Ok(summary) if !summary.is_empty() => {
                            info!(
                                started = ?summary.started,
                                restarted = ?summary.restarted,
                                stopped = ?summary.stopped,
                                "Reconciled refresh jobs"
                            );
                        }
                        Ok(_) => debug!("Refresh jobs unchanged"),
                        Err(e) => {
                            // Retried on the next tick
                            error!(error = %e, "Failed to load job specs");
                        }
                    }
                }
            }
        }

        self.state.send_replace(ControllerState::Stopping);
        self.stop_all_jobs().await;
        self.state.send_replace(ControllerState::Stopped);

        info!("Scheduler stopped gracefully");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Stopping scheduler");
        let mut state_rx = self.state.subscribe();
        self.shutdown.cancel();

        // Never started: nothing else will drain the tasks
        let was_idle = self.state.send_if_modified(|state| {
            if *state == ControllerState::Idle {
                *state = ControllerState::Stopping;
                true
            } else {
                false
            }
        });
        if was_idle {
            self.stop_all_jobs().await;
            self.state.send_replace(ControllerState::Stopped);
        }

        state_rx
            .wait_for(|state| *state == ControllerState::Stopped)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reconcile(&self) -> Result<ReconcileSummary, DatabaseError> {
        let desired = self.desired_specs().await?;
        let mut summary = ReconcileSummary::default();

        let mut jobs = self.jobs.lock().await;
        if self.shutdown.is_cancelled() {
            return Ok(summary);
        }
        jobs.draining.retain(|handle| !handle.is_finished());

        for (table, spec) in &desired {
            match jobs.active.get(table).map(|entry| entry.interval_seconds) {
                None => {
                    let entry = self.spawn_entry(spec, None);
                    jobs.active.insert(table.clone(), entry);
                    summary.started.push(table.clone());
                }
                Some(current) if current != spec.interval_seconds => {
                    info!(
                        table = %table,
                        from = current,
                        to = spec.interval_seconds,
                        "Refresh interval changed, restarting job"
                    );
                    if let Some(old) = jobs.active.remove(table) {
                        old.cancel();
                        let entry = self.spawn_entry(spec, Some(old.handle));
                        jobs.active.insert(table.clone(), entry);
                    }
                    summary.restarted.push(table.clone());
                }
                Some(_) => {}
            }
        }

        let removed: Vec<String> = jobs
            .active
            .keys()
            .filter(|table| !desired.contains_key(*table))
            .cloned()
            .collect();
        for table in removed {
            if let Some(entry) = jobs.active.remove(&table) {
                warn!(table = %table, "Table no longer eligible, stopping job");
                entry.cancel();
                jobs.draining.push(entry.handle);
            }
            summary.stopped.push(table);
        }
        summary.stopped.sort();

        telemetry::update_active_jobs(jobs.active.len());
        Ok(summary)
    }
}
