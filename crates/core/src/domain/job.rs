// Export Job Domain Model

use serde::{Deserialize, Serialize};

/// Job ID (opaque, assigned by the EC3 service at creation)
pub type JobId = String;

/// Status locator returned at creation and used for every status query
pub type StatusLocator = String;

/// Carbon upload state as reported by the EC3 jobs endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarbonUploadState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl CarbonUploadState {
    /// Terminal states end polling for a job
    pub fn is_terminal(&self) -> bool {
        matches!(self, CarbonUploadState::Succeeded | CarbonUploadState::Failed)
    }
}

impl std::fmt::Display for CarbonUploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CarbonUploadState::Queued => write!(f, "Queued"),
            CarbonUploadState::Running => write!(f, "Running"),
            CarbonUploadState::Succeeded => write!(f, "Succeeded"),
            CarbonUploadState::Failed => write!(f, "Failed"),
        }
    }
}

/// One status reading for a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: CarbonUploadState,
    /// Link to the exported project, present once the job succeeded
    pub result_locator: Option<String>,
}

impl JobStatusReport {
    pub fn new(status: CarbonUploadState) -> Self {
        Self {
            status,
            result_locator: None,
        }
    }

    pub fn with_result_locator(mut self, locator: impl Into<String>) -> Self {
        self.result_locator = Some(locator.into());
        self
    }
}

/// Export Job Entity
///
/// Created once by the jobs service; status is only ever discovered by
/// polling, never pushed. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: JobId,
    pub status_locator: StatusLocator,
    pub latest: Option<JobStatusReport>,
}

impl ExportJob {
    pub fn new(id: impl Into<String>, status_locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status_locator: status_locator.into(),
            latest: None,
        }
    }

    /// Record a status reading.
    ///
    /// The latest reading always wins, even when it moves "backwards"
    /// (e.g. Running -> Queued).
    pub fn observe(&mut self, report: JobStatusReport) {
        self.latest = Some(report);
    }

    pub fn status(&self) -> Option<CarbonUploadState> {
        self.latest.as_ref().map(|r| r.status)
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_some_and(|s| s.is_terminal())
    }
}

/// Parameters for creating an export job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub configuration_id: String,
    pub project_name: String,
    pub ec3_bearer_token: String,
}
