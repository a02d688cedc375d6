// Job Status Poller - tracks one export job until it reaches a terminal status

pub mod constants;
mod stop;

use constants::*;
pub use stop::{stop_channel, StopSender, StopToken};

use crate::domain::{CarbonUploadState, ExportDisplay, ExportJob, JobId, JobStatusReport};
use crate::error::{AppError, Result};
use crate::port::{CredentialSupplier, JobsClient};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Lifecycle of a poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PollerState {
    NotStarted,
    Polling,
    Succeeded,
    Failed,
    /// Tracking ceased without a terminal job status
    Stopped,
}

impl PollerState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollerState::NotStarted | PollerState::Polling)
    }
}

impl std::fmt::Display for PollerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollerState::NotStarted => write!(f, "NOT_STARTED"),
            PollerState::Polling => write!(f, "POLLING"),
            PollerState::Succeeded => write!(f, "SUCCEEDED"),
            PollerState::Failed => write!(f, "FAILED"),
            PollerState::Stopped => write!(f, "STOPPED"),
        }
    }
}

impl From<CarbonUploadState> for PollerState {
    fn from(status: CarbonUploadState) -> Self {
        match status {
            CarbonUploadState::Queued | CarbonUploadState::Running => PollerState::Polling,
            CarbonUploadState::Succeeded => PollerState::Succeeded,
            CarbonUploadState::Failed => PollerState::Failed,
        }
    }
}

/// Polling parameters used by services that start pollers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    /// Give up after this many failed queries in a row (`None`: never)
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

/// Observable view of a poller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollerSnapshot {
    pub job_id: Option<JobId>,
    pub state: PollerState,
    pub latest: Option<JobStatusReport>,
    pub queries_issued: u64,
    pub consecutive_failures: u32,
}

impl PollerSnapshot {
    fn initial() -> Self {
        Self {
            job_id: None,
            state: PollerState::NotStarted,
            latest: None,
            queries_issued: 0,
            consecutive_failures: 0,
        }
    }

    pub fn display(&self) -> ExportDisplay {
        ExportDisplay::from_report(self.latest.as_ref())
    }
}

/// Owns the polling lifecycle of exactly one job.
///
/// Subscribers get a [`PollerSnapshot`] on every change. Dropping the poller
/// stops it.
pub struct JobStatusPoller {
    jobs: Arc<dyn JobsClient>,
    credentials: Arc<dyn CredentialSupplier>,
    max_consecutive_failures: Option<u32>,
    snapshot: Arc<watch::Sender<PollerSnapshot>>,
    stop: StopSender,
}

impl JobStatusPoller {
    pub fn new(jobs: Arc<dyn JobsClient>, credentials: Arc<dyn CredentialSupplier>) -> Self {
        let (snapshot, _) = watch::channel(PollerSnapshot::initial());
        let (stop, _) = stop_channel();
        Self {
            jobs,
            credentials,
            max_consecutive_failures: None,
            snapshot: Arc::new(snapshot),
            stop,
        }
    }

    /// Stop after `max` failed queries in a row. `Some(0)` is rejected by
    /// [`start`](Self::start).
    pub fn with_max_consecutive_failures(mut self, max: Option<u32>) -> Self {
        self.max_consecutive_failures = max;
        self
    }

    /// Begin polling `job_id` every `interval`.
    ///
    /// The first query goes out one interval after the credential supplier
    /// resolves. Fails if the poller was already started or stopped, if the
    /// interval is below [`MIN_POLL_INTERVAL`], if the failure cap is zero, or
    /// outside a tokio runtime.
    pub fn start(
        &self,
        job_id: impl Into<String>,
        status_locator: impl Into<String>,
        interval: Duration,
    ) -> Result<()> {
        if interval < MIN_POLL_INTERVAL {
            return Err(AppError::Validation(format!(
                "poll interval {:?} is below the minimum of {:?}",
                interval, MIN_POLL_INTERVAL
            )));
        }
        if self.max_consecutive_failures == Some(0) {
            return Err(AppError::Validation(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::InvalidState(format!("no async runtime: {}", e)))?;

        let job = ExportJob::new(job_id, status_locator);

        let mut previous = PollerState::NotStarted;
        let started = self.snapshot.send_if_modified(|s| {
            previous = s.state;
            if s.state != PollerState::NotStarted {
                return false;
            }
            s.state = PollerState::Polling;
            s.job_id = Some(job.id.clone());
            true
        });
        if !started {
            return Err(AppError::InvalidState(format!(
                "cannot start poller in state {}",
                previous
            )));
        }

        info!(
            job_id = %job.id,
            interval_ms = interval.as_millis() as u64,
            "Starting export status polling"
        );

        let task = PollTask {
            jobs: Arc::clone(&self.jobs),
            credentials: Arc::clone(&self.credentials),
            snapshot: Arc::clone(&self.snapshot),
            max_consecutive_failures: self.max_consecutive_failures,
            interval,
        };
        runtime.spawn(task.run(job, self.stop.token()));
        Ok(())
    }

    /// Stop polling. Idempotent, valid in any state.
    ///
    /// A query already in flight is not aborted, but its answer is discarded.
    pub fn stop(&self) {
        // State first: the polling task applies results only while Polling
        let changed = self.snapshot.send_if_modified(|s| {
            if s.state == PollerState::Stopped {
                return false;
            }
            s.state = PollerState::Stopped;
            true
        });
        self.stop.stop();

        if changed {
            info!(job_id = ?self.snapshot.borrow().job_id, "Export status polling stopped");
        }
    }

    pub fn state(&self) -> PollerState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> PollerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn display(&self) -> ExportDisplay {
        self.snapshot.borrow().display()
    }

    /// Receive a new snapshot on every change
    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.snapshot.subscribe()
    }

    /// Wait until the poller reaches a terminal state.
    ///
    /// Never resolves for a poller that is never started nor stopped.
    pub async fn wait_for_completion(&self) -> PollerSnapshot {
        let mut rx = self.snapshot.subscribe();
        let done = rx
            .wait_for(|s| s.state.is_terminal())
            .await
            .map(|s| (*s).clone());
        match done {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }
}

impl std::fmt::Debug for JobStatusPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.borrow();
        f.debug_struct("JobStatusPoller")
            .field("job_id", &snapshot.job_id)
            .field("state", &snapshot.state)
            .field("max_consecutive_failures", &self.max_consecutive_failures)
            .finish_non_exhaustive()
    }
}

impl Drop for JobStatusPoller {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// State moved into the spawned polling task
struct PollTask {
    jobs: Arc<dyn JobsClient>,
    credentials: Arc<dyn CredentialSupplier>,
    snapshot: Arc<watch::Sender<PollerSnapshot>>,
    max_consecutive_failures: Option<u32>,
    interval: Duration,
}

impl PollTask {
    async fn run(self, mut job: ExportJob, mut stop: StopToken) {
        // No query may go out before the credential is available
        let credential = tokio::select! {
            biased;
            _ = stop.wait() => {
                debug!(job_id = %job.id, "Stopped while waiting for credential");
                return;
            }
            credential = self.credentials.access_token() => credential,
        };
        if let Err(e) = credential {
            warn!(job_id = %job.id, error = %e, "Credential unavailable, polling not started");
            self.snapshot.send_if_modified(|s| {
                if s.state != PollerState::Polling {
                    return false;
                }
                s.state = PollerState::Stopped;
                true
            });
            return;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.wait() => break,
                _ = ticker.tick() => {}
            }
            if self.tick(&mut job, &mut stop).await.is_break() {
                break;
            }
        }
        debug!(
            job_id = %job.id,
            status = ?job.status(),
            finished = job.is_finished(),
            "Polling task exited"
        );
    }

    /// One status query. The query is awaited before the next tick is taken,
    /// so queries never overlap.
    async fn tick(&self, job: &mut ExportJob, stop: &mut StopToken) -> ControlFlow<()> {
        let credential = tokio::select! {
            biased;
            _ = stop.wait() => return ControlFlow::Break(()),
            credential = self.credentials.access_token() => credential,
        };

        let result = match credential {
            Ok(token) => {
                // Counted without waking subscribers
                self.snapshot.send_if_modified(|s| {
                    s.queries_issued += 1;
                    false
                });
                debug!(job_id = %job.id, "Querying export status");
                self.jobs
                    .job_status(&token, &job.id, &job.status_locator)
                    .await
            }
            Err(e) => Err(e),
        };

        if stop.is_stopped() {
            debug!(job_id = %job.id, "Discarding status received after stop");
            return ControlFlow::Break(());
        }

        match result {
            Ok(report) => self.apply_report(job, report),
            Err(e) => self.record_failure(job, e),
        }
    }

    fn apply_report(&self, job: &mut ExportJob, report: JobStatusReport) -> ControlFlow<()> {
        let status = report.status;
        let next_state = PollerState::from(status);
        job.observe(report.clone());

        let applied = self.snapshot.send_if_modified(|s| {
            if s.state != PollerState::Polling {
                return false;
            }
            s.latest = Some(report);
            s.consecutive_failures = 0;
            s.state = next_state;
            true
        });
        if !applied {
            return ControlFlow::Break(());
        }

        if status.is_terminal() {
            info!(job_id = %job.id, status = %status, "Export job finished");
            ControlFlow::Break(())
        } else {
            debug!(job_id = %job.id, status = %status, "Export job pending");
            ControlFlow::Continue(())
        }
    }

    fn record_failure(&self, job: &ExportJob, error: AppError) -> ControlFlow<()> {
        let mut failures = 0;
        let mut exhausted = false;

        let applied = self.snapshot.send_if_modified(|s| {
            if s.state != PollerState::Polling {
                return false;
            }
            s.consecutive_failures += 1;
            failures = s.consecutive_failures;
            if self
                .max_consecutive_failures
                .is_some_and(|max| failures >= max)
            {
                s.state = PollerState::Stopped;
                exhausted = true;
            }
            true
        });
        if !applied {
            return ControlFlow::Break(());
        }

        warn!(
            job_id = %job.id,
            attempt = failures,
            transient = error.is_transient(),
            error = %error,
            "Status query failed"
        );
        if exhausted {
            warn!(job_id = %job.id, attempts = failures, "Giving up on export status");
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}
