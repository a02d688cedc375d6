//! EC3 configuration (template) endpoint adapter

use crate::client::{HttpTransport, Pager};
use crate::dto::{ConfigurationEnvelope, ConfigurationWrite, ConfigurationsPage};
use async_trait::async_trait;
use ec3_export_core::domain::{AccessToken, Configuration};
use ec3_export_core::error::{AppError, Result};
use ec3_export_core::port::ConfigurationClient;
use reqwest::Url;

pub struct HttpConfigurationClient {
    transport: HttpTransport,
}

impl HttpConfigurationClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    fn item_url(&self, id: &str) -> Result<Url> {
        self.transport.ec3_url(&format!("configurations/{}", id))
    }
}

#[async_trait]
impl ConfigurationClient for HttpConfigurationClient {
    async fn list_configurations(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<Configuration>> {
        let mut url = self.transport.ec3_url("configurations")?;
        url.query_pairs_mut().append_pair("iTwinId", project_id);

        let mut configurations = Vec::new();
        let mut next = Some(url);
        let mut pager = Pager::default();
        while let Some(url) = next.take() {
            pager.visit(&url)?;
            let page: ConfigurationsPage = self
                .transport
                .send_json(self.transport.get(url, token))
                .await?;
            configurations.extend(page.configurations.into_iter().map(Configuration::from));
            next = pager.next(page.links.next)?;
        }
        Ok(configurations)
    }

    async fn get_configuration(&self, token: &AccessToken, id: &str) -> Result<Configuration> {
        let envelope: ConfigurationEnvelope = self
            .transport
            .send_json(self.transport.get(self.item_url(id)?, token))
            .await?;
        Ok(envelope.configuration.into())
    }

    async fn create_configuration(
        &self,
        token: &AccessToken,
        configuration: &Configuration,
    ) -> Result<Configuration> {
        let url = self.transport.ec3_url("configurations")?;
        let envelope: ConfigurationEnvelope = self
            .transport
            .send_json(
                self.transport
                    .post(url, token)
                    .json(&ConfigurationWrite::from(configuration)),
            )
            .await?;
        Ok(with_local_report(envelope.configuration.into(), configuration))
    }

    async fn update_configuration(
        &self,
        token: &AccessToken,
        configuration: &Configuration,
    ) -> Result<Configuration> {
        let id = configuration
            .id
            .as_deref()
            .ok_or_else(|| AppError::Validation("configuration id missing".to_string()))?;
        let envelope: ConfigurationEnvelope = self
            .transport
            .send_json(
                self.transport
                    .put(self.item_url(id)?, token)
                    .json(&ConfigurationWrite::from(configuration)),
            )
            .await?;
        Ok(with_local_report(envelope.configuration.into(), configuration))
    }

    async fn delete_configuration(&self, token: &AccessToken, id: &str) -> Result<()> {
        self.transport
            .send(self.transport.delete(self.item_url(id)?, token))
            .await?;
        Ok(())
    }
}

/// Responses to writes may omit the report link; keep what was sent
fn with_local_report(mut saved: Configuration, sent: &Configuration) -> Configuration {
    if saved.report_id.is_empty() {
        saved.report_id = sent.report_id.clone();
    }
    saved
}
