//! Command handlers (composition root: wires HTTP adapters into the services)

use crate::output;
use crate::settings::Settings;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use ec3_export_core::application::{
    ExportRequest, ExportService, JobStatusPoller, PollerSnapshot, PollerState, TemplateService,
};
use ec3_export_core::domain::{Configuration, Ec3Token, ExportDisplay};
use ec3_export_core::port::{
    CredentialSupplier, JobsClient, StaticCredential, SystemTimeProvider, TimeProvider,
};
use ec3_export_infra_http::{
    HttpConfigurationClient, HttpJobsClient, HttpReportsClient, HttpTransport,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct App {
    exports: ExportService,
    templates: TemplateService,
    jobs: Arc<dyn JobsClient>,
    credentials: Arc<dyn CredentialSupplier>,
    time_provider: Arc<dyn TimeProvider>,
}

impl App {
    pub fn new(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::new(&settings.http_config())
            .context("Failed to set up HTTP transport")?;

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let credentials: Arc<dyn CredentialSupplier> =
            Arc::new(StaticCredential::from_optional(settings.access_token.clone()));
        let jobs: Arc<dyn JobsClient> = Arc::new(HttpJobsClient::new(transport.clone()));

        let exports = ExportService::new(
            Arc::clone(&jobs),
            Arc::clone(&credentials),
            Arc::clone(&time_provider),
            settings.poller_config(),
        );
        let templates = TemplateService::new(
            Arc::new(HttpConfigurationClient::new(transport.clone())),
            Arc::new(HttpReportsClient::new(transport)),
            Arc::clone(&credentials),
        );

        Ok(Self {
            exports,
            templates,
            jobs,
            credentials,
            time_provider,
        })
    }

    pub async fn export(
        &self,
        template_id: String,
        project_name: String,
        ec3_token: String,
        expires_in_secs: u64,
        wait: bool,
    ) -> Result<()> {
        let expires_at = expiry_millis(self.time_provider.now_millis(), expires_in_secs);
        let request = ExportRequest {
            template_id,
            project_name,
            ec3_token: Ec3Token::new(ec3_token, expires_at),
        };

        if !wait {
            let job = self.exports.submit(request).await?;
            output::print_job(&job);
            return Ok(());
        }

        output::print_display(&ExportDisplay::Starting);
        let (job, poller) = self.exports.start_export(request).await?;
        output::print_job(&job);
        finish(&job.id, track(&poller).await)
    }

    pub async fn status(&self, job_id: &str, status_url: Option<&str>) -> Result<()> {
        let token = self.credentials.access_token().await?;
        let report = self
            .jobs
            .job_status(&token, job_id, status_url.unwrap_or_default())
            .await
            .with_context(|| format!("Failed to query job {}", job_id))?;
        output::print_status(job_id, &report);
        Ok(())
    }

    pub async fn watch(&self, job_id: &str, status_url: Option<&str>) -> Result<()> {
        let poller = self
            .exports
            .poll_existing(job_id, status_url.unwrap_or_default())?;
        println!("{}", format!("Watching job {}", job_id).cyan().bold());
        finish(job_id, track(&poller).await)
    }

    pub async fn reports(&self, project_id: &str) -> Result<()> {
        let reports = self.templates.list_reports(project_id).await?;
        output::print_reports(reports);
        Ok(())
    }

    pub async fn list_templates(&self, project_id: &str) -> Result<()> {
        let templates = self.templates.list_templates(project_id).await?;
        output::print_templates(templates);
        Ok(())
    }

    pub async fn show_template(&self, id: &str) -> Result<()> {
        let template = self.templates.get_template(id).await?;
        output::print_template(&template);
        Ok(())
    }

    pub async fn save_template(&self, file: &Path, project_id: Option<String>) -> Result<()> {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let mut template: Configuration =
            serde_json::from_str(&raw).context("Invalid template JSON")?;
        if project_id.is_some() {
            template.project_id = project_id;
        }

        let saved = self.templates.save_template(&template).await?;
        println!(
            "{}",
            format!(
                "✓ Template {} saved",
                saved.id.as_deref().unwrap_or(&saved.display_name)
            )
            .green()
            .bold()
        );
        Ok(())
    }

    pub async fn delete_template(&self, id: &str) -> Result<()> {
        self.templates.delete_template(id).await?;
        println!("{}", format!("✓ Template {} deleted", id).green().bold());
        Ok(())
    }
}

/// Print every display change until the poller is terminal. Ctrl-C stops it.
async fn track(poller: &JobStatusPoller) -> PollerSnapshot {
    let mut rx = poller.subscribe();
    let mut shown: Option<ExportDisplay> = None;

    loop {
        let snapshot = rx.borrow_and_update().clone();
        let display = snapshot.display();
        if shown.as_ref() != Some(&display) {
            // Starting was already printed before submission
            if display != ExportDisplay::Starting {
                output::print_display(&display);
            }
            shown = Some(display);
        }
        if snapshot.state.is_terminal() {
            return snapshot;
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return poller.snapshot();
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping status polling");
                poller.stop();
            }
        }
    }
}

fn finish(job_id: &str, snapshot: PollerSnapshot) -> Result<()> {
    output::print_outcome(&snapshot);
    match snapshot.state {
        PollerState::Succeeded => Ok(()),
        PollerState::Failed => bail!("Export job {} failed", job_id),
        state => bail!("Stopped tracking job {} in state {}", job_id, state),
    }
}

/// Absolute expiry in epoch millis, saturating for out-of-range lifetimes
fn expiry_millis(now_millis: i64, expires_in_secs: u64) -> i64 {
    let lifetime = i64::try_from(expires_in_secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    now_millis.saturating_add(lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_millis() {
        assert_eq!(expiry_millis(1_000, 60), 61_000);
        assert_eq!(expiry_millis(1_000, 0), 1_000);
    }

    #[test]
    fn test_expiry_millis_saturates() {
        assert_eq!(expiry_millis(1_700_000_000_000, u64::MAX), i64::MAX);
        assert_eq!(expiry_millis(1_700_000_000_000, i64::MAX as u64 / 1000), i64::MAX);
    }
}
