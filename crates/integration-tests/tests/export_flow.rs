//! Export tracking scenarios driven through the public service API
//!
//! Time is paused, so ticks are deterministic.

use std::sync::Arc;
use std::time::Duration;

use ec3_export_core::application::{
    ExportRequest, ExportService, JobStatusPoller, PollerConfig, PollerState,
};
use ec3_export_core::domain::{
    CarbonUploadState, Ec3Token, ExportDisplay, ExportJob, JobStatusReport,
};
use ec3_export_core::port::credential_supplier::mocks::MockCredentialSupplier;
use ec3_export_core::port::jobs_client::mocks::MockJobsClient;
use ec3_export_core::port::time_provider::mocks::MockTimeProvider;
use tokio::time::sleep;

const JOB_ID: &str = "4444-3333-2222-1111";
const NOW: i64 = 1_700_000_000_000;
const INTERVAL: Duration = Duration::from_secs(5);

fn request() -> ExportRequest {
    ExportRequest {
        template_id: "1111-2222-3333-4444".to_string(),
        project_name: "Tower".to_string(),
        ec3_token: Ec3Token::new("ec3-token", NOW + 3_600_000),
    }
}

fn service(
    jobs: Arc<MockJobsClient>,
    credentials: Arc<MockCredentialSupplier>,
    max_consecutive_failures: Option<u32>,
) -> ExportService {
    ExportService::new(
        jobs,
        credentials,
        Arc::new(MockTimeProvider::new(NOW)),
        PollerConfig {
            interval: INTERVAL,
            max_consecutive_failures,
        },
    )
}

fn jobs() -> Arc<MockJobsClient> {
    Arc::new(MockJobsClient::new(ExportJob::new(
        JOB_ID,
        format!("https://example.com/ec3/jobs/{}", JOB_ID),
    )))
}

/// Queued, Running, Succeeded, then silence
#[tokio::test(start_paused = true)]
async fn test_export_reaches_succeeded_and_goes_quiet() {
    let jobs = jobs();
    let svc = service(jobs.clone(), Arc::new(MockCredentialSupplier::ready("token")), None);
    jobs.push_status(CarbonUploadState::Queued);
    jobs.push_status(CarbonUploadState::Running);
    jobs.push_status(
        JobStatusReport::new(CarbonUploadState::Succeeded)
            .with_result_locator("https://buildingtransparency.org/ec3/projects/77"),
    );

    let (job, poller) = svc.start_export(request()).await.unwrap();
    assert_eq!(job.id, JOB_ID);
    assert_eq!(poller.display(), ExportDisplay::Starting);

    let mut rx = poller.subscribe();
    let mut seen = Vec::new();
    while !rx.borrow().state.is_terminal() {
        rx.changed().await.unwrap();
        let display = rx.borrow_and_update().display();
        if seen.last() != Some(&display) {
            seen.push(display);
        }
    }

    assert_eq!(
        seen,
        vec![
            ExportDisplay::Queued,
            ExportDisplay::Running,
            ExportDisplay::Succeeded {
                link: Some("https://buildingtransparency.org/ec3/projects/77".to_string())
            },
        ]
    );
    assert_eq!(poller.display().action_label(), Some("Open in EC3"));

    sleep(INTERVAL * 20).await;
    assert_eq!(jobs.status_call_count(), 3);
    assert!(jobs
        .status_calls()
        .iter()
        .all(|(id, locator)| id == JOB_ID && locator.ends_with(JOB_ID)));
}

#[tokio::test(start_paused = true)]
async fn test_export_failed_on_first_tick() {
    let jobs = jobs();
    let svc = service(jobs.clone(), Arc::new(MockCredentialSupplier::ready("token")), None);
    jobs.push_status(CarbonUploadState::Failed);

    let (_, poller) = svc.start_export(request()).await.unwrap();
    let done = poller.wait_for_completion().await;

    assert_eq!(done.state, PollerState::Failed);
    assert_eq!(done.display().message(), "Export failed");
    assert_eq!(done.queries_issued, 1);

    sleep(INTERVAL * 20).await;
    assert_eq!(jobs.status_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_creation_waits_for_credential_and_polling_follows() {
    let jobs = jobs();
    let credentials = Arc::new(MockCredentialSupplier::pending("token"));
    let svc = Arc::new(service(jobs.clone(), credentials.clone(), None));
    jobs.push_status(CarbonUploadState::Succeeded);

    let pending = {
        let svc = Arc::clone(&svc);
        tokio::spawn(async move { svc.start_export(request()).await })
    };
    sleep(INTERVAL * 5).await;
    assert!(jobs.created_requests().is_empty());
    assert_eq!(jobs.status_call_count(), 0);

    credentials.release();
    let (_, poller) = pending.await.unwrap().unwrap();
    let done = poller.wait_for_completion().await;

    assert_eq!(done.state, PollerState::Succeeded);
    assert_eq!(jobs.created_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_outage_keeps_status_until_service_recovers() {
    let jobs = jobs();
    let svc = service(jobs.clone(), Arc::new(MockCredentialSupplier::ready("token")), None);
    jobs.push_status(CarbonUploadState::Running);
    for _ in 0..5 {
        jobs.push_transport_error("503 Service Unavailable");
    }
    jobs.push_status(CarbonUploadState::Succeeded);

    let poller = svc.poll_existing(JOB_ID, "").unwrap();

    sleep(INTERVAL * 3 + Duration::from_millis(100)).await;
    let snapshot = poller.snapshot();
    assert_eq!(snapshot.state, PollerState::Polling);
    assert_eq!(snapshot.display(), ExportDisplay::Running);
    assert_eq!(snapshot.consecutive_failures, 2);

    let done = poller.wait_for_completion().await;
    assert_eq!(done.state, PollerState::Succeeded);
    assert_eq!(done.queries_issued, 7);
}

#[tokio::test(start_paused = true)]
async fn test_failure_cap_gives_up() {
    let jobs = jobs();
    let svc = service(jobs.clone(), Arc::new(MockCredentialSupplier::ready("token")), Some(3));
    jobs.push_status(CarbonUploadState::Queued);
    jobs.push_transport_error("timeout");

    let poller = svc.poll_existing(JOB_ID, "").unwrap();
    let done = poller.wait_for_completion().await;

    assert_eq!(done.state, PollerState::Stopped);
    assert_eq!(done.consecutive_failures, 3);
    assert_eq!(done.display(), ExportDisplay::Queued);

    sleep(INTERVAL * 10).await;
    assert_eq!(jobs.status_call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_stopping_one_poller_leaves_others_running() {
    let jobs = jobs();
    let credentials = Arc::new(MockCredentialSupplier::ready("token"));
    jobs.push_status(CarbonUploadState::Running);

    let first = JobStatusPoller::new(jobs.clone(), credentials.clone());
    let second = JobStatusPoller::new(jobs.clone(), credentials);
    first.start("job-a", "", INTERVAL).unwrap();
    second.start("job-b", "", INTERVAL).unwrap();

    sleep(INTERVAL + Duration::from_millis(100)).await;
    first.stop();
    sleep(INTERVAL * 3).await;

    let calls = jobs.status_calls();
    assert_eq!(calls.iter().filter(|(id, _)| id == "job-a").count(), 1);
    assert_eq!(calls.iter().filter(|(id, _)| id == "job-b").count(), 4);
    assert_eq!(first.state(), PollerState::Stopped);
    assert_eq!(second.state(), PollerState::Polling);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_poller_stops_queries() {
    let jobs = jobs();
    let svc = service(jobs.clone(), Arc::new(MockCredentialSupplier::ready("token")), None);
    jobs.push_status(CarbonUploadState::Queued);

    let poller = svc.poll_existing(JOB_ID, "").unwrap();
    sleep(INTERVAL + Duration::from_millis(100)).await;
    assert_eq!(jobs.status_call_count(), 1);

    drop(poller);
    sleep(INTERVAL * 10).await;
    assert_eq!(jobs.status_call_count(), 1);
}
