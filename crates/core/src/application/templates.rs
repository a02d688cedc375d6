// Template Service - report catalogue and EC3 template persistence

use crate::domain::{sort_reports, Configuration, Report};
use crate::error::{AppError, Result};
use crate::port::{ConfigurationClient, CredentialSupplier, ReportsClient};
use std::sync::Arc;
use tracing::{debug, info};

pub struct TemplateService {
    configurations: Arc<dyn ConfigurationClient>,
    reports: Arc<dyn ReportsClient>,
    credentials: Arc<dyn CredentialSupplier>,
}

impl TemplateService {
    pub fn new(
        configurations: Arc<dyn ConfigurationClient>,
        reports: Arc<dyn ReportsClient>,
        credentials: Arc<dyn CredentialSupplier>,
    ) -> Self {
        Self {
            configurations,
            reports,
            credentials,
        }
    }

    /// Selectable reports of a project, sorted by name
    pub async fn list_reports(&self, project_id: &str) -> Result<Vec<Report>> {
        let token = self.credentials.access_token().await?;
        let mut reports: Vec<Report> = self
            .reports
            .list_reports(&token, project_id)
            .await?
            .into_iter()
            .filter(|r| !r.deleted)
            .collect();
        sort_reports(&mut reports);

        debug!(project_id, count = reports.len(), "Loaded reports");
        Ok(reports)
    }

    pub async fn list_templates(&self, project_id: &str) -> Result<Vec<Configuration>> {
        let token = self.credentials.access_token().await?;
        let mut templates = self
            .configurations
            .list_configurations(&token, project_id)
            .await?;
        templates.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
        });
        Ok(templates)
    }

    pub async fn get_template(&self, id: &str) -> Result<Configuration> {
        let token = self.credentials.access_token().await?;
        self.configurations.get_configuration(&token, id).await
    }

    /// Create the template when it has no id yet, update it otherwise
    pub async fn save_template(&self, template: &Configuration) -> Result<Configuration> {
        template.validate()?;
        let token = self.credentials.access_token().await?;

        let saved = match template.id {
            Some(_) => {
                self.configurations
                    .update_configuration(&token, template)
                    .await?
            }
            None => {
                self.configurations
                    .create_configuration(&token, template)
                    .await?
            }
        };

        info!(
            template_id = ?saved.id,
            labels = saved.labels.len(),
            "Template saved"
        );
        Ok(saved)
    }

    pub async fn delete_template(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(AppError::Validation("Template id cannot be empty".to_string()));
        }
        let token = self.credentials.access_token().await?;
        self.configurations.delete_configuration(&token, id).await?;
        info!(template_id = id, "Template deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, Label};
    use crate::port::credential_supplier::mocks::MockCredentialSupplier;
    use crate::port::template_client::mocks::{InMemoryConfigurationClient, StaticReportsClient};

    fn report(id: &str, name: &str, deleted: bool) -> Report {
        Report {
            id: id.to_string(),
            display_name: name.to_string(),
            description: None,
            deleted,
        }
    }

    fn service(store: Arc<InMemoryConfigurationClient>, reports: Vec<Report>) -> TemplateService {
        TemplateService::new(
            store,
            Arc::new(StaticReportsClient::new(reports)),
            Arc::new(MockCredentialSupplier::ready("token")),
        )
    }

    #[tokio::test]
    async fn test_list_reports_sorted_without_deleted() {
        let svc = service(
            Arc::new(InMemoryConfigurationClient::new()),
            vec![
                report("1", "Walls", false),
                report("2", "beams", false),
                report("3", "Archived", true),
            ],
        );

        let reports = svc.list_reports("project").await.unwrap();
        let ids: Vec<_> = reports.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let store = Arc::new(InMemoryConfigurationClient::new());
        let svc = service(store.clone(), vec![]);

        let mut template = Configuration::new("Walls", "report-1");
        template.project_id = Some("project".to_string());
        let created = svc.save_template(&template).await.unwrap();
        assert!(created.id.is_some());
        assert_eq!(store.create_count(), 1);

        let mut edited = created.clone();
        edited.upsert_label(Label {
            name: String::new(),
            report_table: "Walls_Table".to_string(),
            element_name_column: "Name".to_string(),
            element_quantity_column: "Volume".to_string(),
            materials: vec![],
        });
        svc.save_template(&edited).await.unwrap();
        assert_eq!(store.update_count(), 1);

        let loaded = svc.get_template(created.id.as_deref().unwrap()).await.unwrap();
        assert_eq!(loaded.labels.len(), 1);
        assert_eq!(svc.list_templates("project").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_incomplete_template() {
        let store = Arc::new(InMemoryConfigurationClient::new());
        let svc = service(store.clone(), vec![]);

        let err = svc
            .save_template(&Configuration::new("Walls", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::ValidationError(_))));
        assert_eq!(store.create_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_template() {
        let svc = service(Arc::new(InMemoryConfigurationClient::new()), vec![]);

        let err = svc.delete_template("cfg-404").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
