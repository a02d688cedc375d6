//! EC3 jobs endpoint adapter

use crate::client::{join, HttpTransport};
use crate::dto::{JobEnvelope, JobStatusEnvelope};
use async_trait::async_trait;
use ec3_export_core::domain::{AccessToken, CreateJobRequest, ExportJob, JobStatusReport};
use ec3_export_core::error::Result;
use ec3_export_core::port::JobsClient;
use reqwest::Url;
use tracing::debug;

/// `JobsClient` over `POST {ec3}/jobs` and `GET <status locator>`
pub struct HttpJobsClient {
    transport: HttpTransport,
}

impl HttpJobsClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl JobsClient for HttpJobsClient {
    async fn create_job(
        &self,
        token: &AccessToken,
        request: &CreateJobRequest,
    ) -> Result<ExportJob> {
        let url = self.transport.ec3_url("jobs")?;
        let envelope: JobEnvelope = self
            .transport
            .send_json(self.transport.post(url, token).json(request))
            .await?;

        let job = envelope.job;
        let status_locator = match job.links.status {
            Some(link) => link.href,
            None => default_status_url(self.transport.ec3_base(), &job.id)?.to_string(),
        };
        debug!(job_id = %job.id, status_locator = %status_locator, "Job created");
        Ok(ExportJob::new(job.id, status_locator))
    }

    async fn job_status(
        &self,
        token: &AccessToken,
        job_id: &str,
        status_locator: &str,
    ) -> Result<JobStatusReport> {
        let url = status_url(self.transport.ec3_base(), job_id, status_locator)?;
        let envelope: JobStatusEnvelope = self
            .transport
            .send_json(self.transport.get(url, token))
            .await?;

        let status = envelope.job;
        let mut report = JobStatusReport::new(status.status);
        if let Some(link) = status.links.ec3_project {
            report = report.with_result_locator(link.href);
        }
        Ok(report)
    }
}

fn default_status_url(base: &Url, job_id: &str) -> Result<Url> {
    join(base, &format!("jobs/{}", job_id))
}

/// Resolve where to query a job's status.
///
/// Absolute locators are used as-is, relative ones are resolved against the
/// EC3 base, and a missing locator falls back to `jobs/{id}`.
fn status_url(base: &Url, job_id: &str, status_locator: &str) -> Result<Url> {
    let locator = status_locator.trim();
    if locator.is_empty() {
        return default_status_url(base, job_id);
    }
    match Url::parse(locator) {
        Ok(url) => Ok(url),
        Err(_) => join(base, locator),
    }
}
