// Port Layer - Interfaces for external dependencies

pub mod credential_supplier;
pub mod jobs_client;
pub mod template_client;
pub mod time_provider;

// Re-exports
pub use credential_supplier::{CredentialSupplier, StaticCredential};
pub use jobs_client::JobsClient;
pub use template_client::{ConfigurationClient, ReportsClient};
pub use time_provider::{SystemTimeProvider, TimeProvider};
