//! Reporting service adapter

use crate::client::{HttpTransport, Pager};
use crate::dto::ReportsPage;
use async_trait::async_trait;
use ec3_export_core::domain::{AccessToken, Report};
use ec3_export_core::error::Result;
use ec3_export_core::port::ReportsClient;
use reqwest::Url;
use tracing::debug;

pub struct HttpReportsClient {
    transport: HttpTransport,
}

impl HttpReportsClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    fn first_page_url(&self, project_id: &str) -> Result<Url> {
        let mut url = self.transport.reporting_url("reports")?;
        url.query_pairs_mut().append_pair("projectId", project_id);
        Ok(url)
    }
}

#[async_trait]
impl ReportsClient for HttpReportsClient {
    async fn list_reports(&self, token: &AccessToken, project_id: &str) -> Result<Vec<Report>> {
        let mut reports = Vec::new();
        let mut next = Some(self.first_page_url(project_id)?);
        let mut pages = 0usize;
        let mut pager = Pager::default();

        while let Some(url) = next.take() {
            pager.visit(&url)?;
            let page: ReportsPage = self
                .transport
                .send_json(self.transport.get(url, token))
                .await?;
            pages += 1;
            reports.extend(page.reports);
            next = pager.next(page.links.next)?;
        }

        debug!(project_id, pages, count = reports.len(), "Fetched reports");
        Ok(reports)
    }
}
