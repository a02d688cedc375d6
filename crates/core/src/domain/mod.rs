// Domain Layer - Pure business logic and entities

pub mod display;
pub mod error;
pub mod job;
pub mod template;
pub mod token;

// Re-exports
pub use display::ExportDisplay;
pub use error::DomainError;
pub use job::{
    CarbonUploadState, CreateJobRequest, ExportJob, JobId, JobStatusReport, StatusLocator,
};
pub use template::{report_id_from_href, sort_reports, Configuration, Label, Material, Report};
pub use token::{AccessToken, Ec3Token};
