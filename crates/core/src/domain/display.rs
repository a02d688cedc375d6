// Export display state (what a tracking surface shows for a job)

use super::job::{CarbonUploadState, JobStatusReport};
use serde::Serialize;

/// Presentation-neutral display state of an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExportDisplay {
    /// Job created (or being created), no status observed yet
    Starting,
    Queued,
    Running,
    /// Completed; `link` opens the exported project when the service returned one
    Succeeded { link: Option<String> },
    Failed,
}

impl ExportDisplay {
    pub fn from_report(report: Option<&JobStatusReport>) -> Self {
        match report {
            None => ExportDisplay::Starting,
            Some(r) => match r.status {
                CarbonUploadState::Queued => ExportDisplay::Queued,
                CarbonUploadState::Running => ExportDisplay::Running,
                CarbonUploadState::Succeeded => ExportDisplay::Succeeded {
                    link: r.result_locator.clone(),
                },
                CarbonUploadState::Failed => ExportDisplay::Failed,
            },
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ExportDisplay::Starting => "Export starting",
            ExportDisplay::Queued => "Export queued",
            ExportDisplay::Running => "Export running",
            ExportDisplay::Succeeded { .. } => "Export succeeded",
            ExportDisplay::Failed => "Export failed",
        }
    }

    /// Label of the completion action, if the state offers one
    pub fn action_label(&self) -> Option<&'static str> {
        match self {
            ExportDisplay::Succeeded { .. } => Some("Open in EC3"),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ExportDisplay::Starting | ExportDisplay::Queued | ExportDisplay::Running
        )
    }
}

impl std::fmt::Display for ExportDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}
