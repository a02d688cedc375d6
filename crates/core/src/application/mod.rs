// Application Layer - Use Cases and Business Logic

pub mod export;
pub mod poller;
pub mod templates;

// Re-exports
pub use export::{ExportRequest, ExportService};
pub use poller::{JobStatusPoller, PollerConfig, PollerSnapshot, PollerState};
pub use templates::TemplateService;
