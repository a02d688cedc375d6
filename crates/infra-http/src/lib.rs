// EC3 Export Infrastructure - HTTP Adapters
// Implements: JobsClient, ConfigurationClient, ReportsClient

mod client;
mod configurations;
mod dto;
mod jobs;
mod reports;

pub use client::{
    HttpClientConfig, HttpTransport, DEFAULT_EC3_BASE_URL, DEFAULT_REPORTING_BASE_URL,
    DEFAULT_REQUEST_TIMEOUT,
};
pub use configurations::HttpConfigurationClient;
pub use jobs::HttpJobsClient;
pub use reports::HttpReportsClient;
