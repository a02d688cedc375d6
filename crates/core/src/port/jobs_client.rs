// EC3 Jobs Client Port
// Job submission and status lookup against the carbon-calculation service

use crate::domain::{AccessToken, CreateJobRequest, ExportJob, JobStatusReport};
use crate::error::Result;
use async_trait::async_trait;

/// Jobs client interface
///
/// Implementations:
/// - HttpJobsClient (infra-http): REST calls against the EC3 jobs endpoint
#[async_trait]
pub trait JobsClient: Send + Sync {
    /// Submit an export job
    ///
    /// Returns the job id and the status locator assigned by the service.
    async fn create_job(
        &self,
        token: &AccessToken,
        request: &CreateJobRequest,
    ) -> Result<ExportJob>;

    /// Query the current status of a job
    ///
    /// # Arguments
    /// * `job_id` - Job identifier returned by `create_job`
    /// * `status_locator` - Status resource returned by `create_job`
    async fn job_status(
        &self,
        token: &AccessToken,
        job_id: &str,
        status_locator: &str,
    ) -> Result<JobStatusReport>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "mocks"))]
pub mod mocks {
    use super::*;
    use crate::domain::CarbonUploadState;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// One scripted answer of the status endpoint
    #[derive(Debug, Clone)]
    pub enum MockStatus {
        Report(JobStatusReport),
        TransportError(String),
    }

    impl From<JobStatusReport> for MockStatus {
        fn from(report: JobStatusReport) -> Self {
            MockStatus::Report(report)
        }
    }

    impl From<CarbonUploadState> for MockStatus {
        fn from(state: CarbonUploadState) -> Self {
            MockStatus::Report(JobStatusReport::new(state))
        }
    }

    /// Scripted jobs client
    ///
    /// Status answers are consumed in order. Once the script runs dry the
    /// last answer is repeated.
    pub struct MockJobsClient {
        job: Mutex<Option<std::result::Result<ExportJob, String>>>,
        script: Mutex<VecDeque<MockStatus>>,
        last: Mutex<Option<MockStatus>>,
        delay: Mutex<Duration>,
        created: Arc<Mutex<Vec<CreateJobRequest>>>,
        status_calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockJobsClient {
        /// `create_job` answers with `job`
        pub fn new(job: ExportJob) -> Self {
            Self {
                job: Mutex::new(Some(Ok(job))),
                script: Mutex::new(VecDeque::new()),
                last: Mutex::new(None),
                delay: Mutex::new(Duration::ZERO),
                created: Arc::new(Mutex::new(Vec::new())),
                status_calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// `create_job` fails with an API error
        pub fn new_create_failure(message: impl Into<String>) -> Self {
            let client = Self::new(ExportJob::new("", ""));
            *client.job.lock().unwrap() = Some(Err(message.into()));
            client
        }

        /// Append answers to the status script
        pub fn push_status(&self, status: impl Into<MockStatus>) {
            self.script.lock().unwrap().push_back(status.into());
        }

        pub fn push_transport_error(&self, message: impl Into<String>) {
            self.push_status(MockStatus::TransportError(message.into()));
        }

        /// Every status query takes this long before answering
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = delay;
        }

        pub fn status_call_count(&self) -> usize {
            self.status_calls.lock().unwrap().len()
        }

        /// (job_id, status_locator) of each status query, in order
        pub fn status_calls(&self) -> Vec<(String, String)> {
            self.status_calls.lock().unwrap().clone()
        }

        pub fn created_requests(&self) -> Vec<CreateJobRequest> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobsClient for MockJobsClient {
        async fn create_job(
            &self,
            _token: &AccessToken,
            request: &CreateJobRequest,
        ) -> Result<ExportJob> {
            self.created.lock().unwrap().push(request.clone());
            match self.job.lock().unwrap().clone() {
                Some(Ok(job)) => Ok(job),
                Some(Err(message)) => Err(AppError::Api {
                    status: 422,
                    message,
                }),
                None => Err(AppError::Internal("no scripted job".to_string())),
            }
        }

        async fn job_status(
            &self,
            _token: &AccessToken,
            job_id: &str,
            status_locator: &str,
        ) -> Result<JobStatusReport> {
            self.status_calls
                .lock()
                .unwrap()
                .push((job_id.to_string(), status_locator.to_string()));

            let delay = *self.delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let next = {
                let mut script = self.script.lock().unwrap();
                let mut last = self.last.lock().unwrap();
                match script.pop_front() {
                    Some(answer) => {
                        *last = Some(answer.clone());
                        Some(answer)
                    }
                    None => last.clone(),
                }
            };

            match next {
                Some(MockStatus::Report(report)) => Ok(report),
                Some(MockStatus::TransportError(message)) => Err(AppError::Transport(message)),
                None => Err(AppError::Transport("no scripted status".to_string())),
            }
        }
    }
}
