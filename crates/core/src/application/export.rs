// Export Service - submits export jobs and hands them to a status poller

use crate::application::poller::{JobStatusPoller, PollerConfig};
use crate::domain::{CreateJobRequest, DomainError, Ec3Token, ExportJob};
use crate::error::{AppError, Result};
use crate::port::{CredentialSupplier, JobsClient, TimeProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// What the user asked to export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// EC3 template (configuration) to export with
    pub template_id: String,
    pub project_name: String,
    pub ec3_token: Ec3Token,
}

/// Export use cases
pub struct ExportService {
    jobs: Arc<dyn JobsClient>,
    credentials: Arc<dyn CredentialSupplier>,
    time_provider: Arc<dyn TimeProvider>,
    poller_config: PollerConfig,
}

impl ExportService {
    pub fn new(
        jobs: Arc<dyn JobsClient>,
        credentials: Arc<dyn CredentialSupplier>,
        time_provider: Arc<dyn TimeProvider>,
        poller_config: PollerConfig,
    ) -> Self {
        Self {
            jobs,
            credentials,
            time_provider,
            poller_config,
        }
    }

    /// Create an export job. Nothing is tracked on failure.
    pub async fn submit(&self, req: ExportRequest) -> Result<ExportJob> {
        validate_request(&req, self.time_provider.now_millis())?;

        let token = self.credentials.access_token().await?;
        let create = CreateJobRequest {
            configuration_id: req.template_id,
            project_name: req.project_name,
            ec3_bearer_token: req.ec3_token.token,
        };

        match self.jobs.create_job(&token, &create).await {
            Ok(job) => {
                info!(
                    job_id = %job.id,
                    template_id = %create.configuration_id,
                    "Export job created"
                );
                Ok(job)
            }
            Err(e) => {
                error!(
                    template_id = %create.configuration_id,
                    error = %e,
                    "Export job creation failed"
                );
                Err(e)
            }
        }
    }

    /// Create an export job and start tracking it
    pub async fn start_export(&self, req: ExportRequest) -> Result<(ExportJob, JobStatusPoller)> {
        let job = self.submit(req).await?;
        let poller = self.poll_existing(&job.id, &job.status_locator)?;
        Ok((job, poller))
    }

    /// Track a job created elsewhere
    pub fn poll_existing(&self, job_id: &str, status_locator: &str) -> Result<JobStatusPoller> {
        let poller = JobStatusPoller::new(Arc::clone(&self.jobs), Arc::clone(&self.credentials))
            .with_max_consecutive_failures(self.poller_config.max_consecutive_failures);
        poller.start(job_id, status_locator, self.poller_config.interval)?;
        Ok(poller)
    }
}

/// Minimal request checks (ids present, EC3 session alive)
pub fn validate_request(req: &ExportRequest, now_millis: i64) -> Result<()> {
    if req.template_id.trim().is_empty() {
        return Err(AppError::Validation("Template id cannot be empty".to_string()));
    }
    if req.project_name.trim().is_empty() {
        return Err(AppError::Validation(
            "Project name cannot be empty".to_string(),
        ));
    }
    if !req.ec3_token.is_valid(now_millis) {
        return Err(DomainError::Ec3TokenExpired.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::poller::PollerState;
    use crate::domain::CarbonUploadState;
    use crate::port::credential_supplier::mocks::MockCredentialSupplier;
    use crate::port::jobs_client::mocks::MockJobsClient;
    use crate::port::time_provider::mocks::MockTimeProvider;
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000_000;

    fn request(expires_at: i64) -> ExportRequest {
        ExportRequest {
            template_id: "1111-2222-3333-4444".to_string(),
            project_name: "Tower".to_string(),
            ec3_token: Ec3Token::new(uuid::Uuid::new_v4().to_string(), expires_at),
        }
    }

    fn service(jobs: Arc<MockJobsClient>, credentials: MockCredentialSupplier) -> ExportService {
        ExportService::new(
            jobs,
            Arc::new(credentials),
            Arc::new(MockTimeProvider::new(NOW)),
            PollerConfig {
                interval: Duration::from_secs(5),
                max_consecutive_failures: None,
            },
        )
    }

    #[tokio::test]
    async fn test_submit_creates_job() {
        let jobs = Arc::new(MockJobsClient::new(ExportJob::new("4444-3333-2222-1111", "status")));
        let svc = service(jobs.clone(), MockCredentialSupplier::ready("token"));

        let req = request(NOW + 60_000);
        let ec3 = req.ec3_token.token.clone();
        let job = svc.submit(req).await.unwrap();

        assert_eq!(job.id, "4444-3333-2222-1111");
        assert_eq!(job.status_locator, "status");
        let created = jobs.created_requests();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].configuration_id, "1111-2222-3333-4444");
        assert_eq!(created[0].ec3_bearer_token, ec3);
    }

    #[tokio::test]
    async fn test_expired_ec3_token_rejected() {
        let jobs = Arc::new(MockJobsClient::new(ExportJob::new("job", "status")));
        let svc = service(jobs.clone(), MockCredentialSupplier::ready("token"));

        let err = svc.submit(request(NOW - 1)).await.unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::Ec3TokenExpired)));
        assert!(jobs.created_requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_template_rejected() {
        let jobs = Arc::new(MockJobsClient::new(ExportJob::new("job", "status")));
        let svc = service(jobs.clone(), MockCredentialSupplier::ready("token"));

        let mut req = request(NOW + 60_000);
        req.template_id = " ".to_string();
        let err = svc.submit(req).await.unwrap_err();
        assert!(err.to_string().contains("Template id"));
    }

    #[tokio::test]
    async fn test_creation_failure_is_surfaced() {
        let jobs = Arc::new(MockJobsClient::new_create_failure("configuration not found"));
        let svc = service(jobs.clone(), MockCredentialSupplier::ready("token"));

        let err = svc.start_export(request(NOW + 60_000)).await.unwrap_err();
        assert!(matches!(err, AppError::Api { status: 422, .. }));
        assert_eq!(jobs.status_call_count(), 0);
    }

    #[tokio::test]
    async fn test_credential_failure_blocks_creation() {
        let jobs = Arc::new(MockJobsClient::new(ExportJob::new("job", "status")));
        let svc = service(jobs.clone(), MockCredentialSupplier::failing());

        let err = svc.submit(request(NOW + 60_000)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(jobs.created_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_export_tracks_until_done() {
        let jobs = Arc::new(MockJobsClient::new(ExportJob::new("4444-3333-2222-1111", "status")));
        jobs.push_status(CarbonUploadState::Running);
        jobs.push_status(CarbonUploadState::Succeeded);
        let svc = service(jobs.clone(), MockCredentialSupplier::ready("token"));

        let (job, poller) = svc.start_export(request(NOW + 60_000)).await.unwrap();
        let done = poller.wait_for_completion().await;

        assert_eq!(done.job_id.as_deref(), Some(job.id.as_str()));
        assert_eq!(done.state, PollerState::Succeeded);
        assert_eq!(jobs.status_call_count(), 2);
    }
}
