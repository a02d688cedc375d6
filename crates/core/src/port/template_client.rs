// Template & Report Client Ports

use crate::domain::{AccessToken, Configuration, Report};
use crate::error::Result;
use async_trait::async_trait;

/// EC3 configuration (template) store
#[async_trait]
pub trait ConfigurationClient: Send + Sync {
    async fn list_configurations(
        &self,
        token: &AccessToken,
        project_id: &str,
    ) -> Result<Vec<Configuration>>;

    /// Fetch one configuration; `report_id` is filled from its report link
    async fn get_configuration(&self, token: &AccessToken, id: &str) -> Result<Configuration>;

    async fn create_configuration(
        &self,
        token: &AccessToken,
        configuration: &Configuration,
    ) -> Result<Configuration>;

    /// Update an existing configuration (requires `configuration.id`)
    async fn update_configuration(
        &self,
        token: &AccessToken,
        configuration: &Configuration,
    ) -> Result<Configuration>;

    async fn delete_configuration(&self, token: &AccessToken, id: &str) -> Result<()>;
}

/// Reporting service (report catalogue of a project)
#[async_trait]
pub trait ReportsClient: Send + Sync {
    /// All reports of a project, every page
    async fn list_reports(&self, token: &AccessToken, project_id: &str) -> Result<Vec<Report>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "mocks"))]
pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory configuration store
    #[derive(Default)]
    pub struct InMemoryConfigurationClient {
        items: Mutex<BTreeMap<String, Configuration>>,
        next_id: AtomicU64,
        creates: AtomicU64,
        updates: AtomicU64,
    }

    impl InMemoryConfigurationClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, configuration: Configuration) {
            if let Some(id) = configuration.id.clone() {
                self.items.lock().unwrap().insert(id, configuration);
            }
        }

        pub fn create_count(&self) -> u64 {
            self.creates.load(Ordering::SeqCst)
        }

        pub fn update_count(&self) -> u64 {
            self.updates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ConfigurationClient for InMemoryConfigurationClient {
        async fn list_configurations(
            &self,
            _token: &AccessToken,
            project_id: &str,
        ) -> Result<Vec<Configuration>> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.project_id.as_deref() == Some(project_id))
                .cloned()
                .collect())
        }

        async fn get_configuration(
            &self,
            _token: &AccessToken,
            id: &str,
        ) -> Result<Configuration> {
            self.items
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("configuration {}", id)))
        }

        async fn create_configuration(
            &self,
            _token: &AccessToken,
            configuration: &Configuration,
        ) -> Result<Configuration> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let id = format!("cfg-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let mut stored = configuration.clone();
            stored.id = Some(id.clone());
            self.items.lock().unwrap().insert(id, stored.clone());
            Ok(stored)
        }

        async fn update_configuration(
            &self,
            _token: &AccessToken,
            configuration: &Configuration,
        ) -> Result<Configuration> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            let id = configuration
                .id
                .clone()
                .ok_or_else(|| AppError::Validation("configuration id missing".to_string()))?;
            let mut items = self.items.lock().unwrap();
            if !items.contains_key(&id) {
                return Err(AppError::NotFound(format!("configuration {}", id)));
            }
            items.insert(id, configuration.clone());
            Ok(configuration.clone())
        }

        async fn delete_configuration(&self, _token: &AccessToken, id: &str) -> Result<()> {
            self.items
                .lock()
                .unwrap()
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| AppError::NotFound(format!("configuration {}", id)))
        }
    }

    /// Fixed report catalogue
    pub struct StaticReportsClient {
        reports: Vec<Report>,
    }

    impl StaticReportsClient {
        pub fn new(reports: Vec<Report>) -> Self {
            Self { reports }
        }
    }

    #[async_trait]
    impl ReportsClient for StaticReportsClient {
        async fn list_reports(
            &self,
            _token: &AccessToken,
            _project_id: &str,
        ) -> Result<Vec<Report>> {
            Ok(self.reports.clone())
        }
    }
}
