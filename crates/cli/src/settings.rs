//! Layered settings: built-in defaults, then the optional TOML file, then
//! `EC3_EXPORT_*` environment variables. Command-line flags apply last.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use ec3_export_core::application::PollerConfig;
use ec3_export_infra_http::{
    HttpClientConfig, DEFAULT_EC3_BASE_URL, DEFAULT_REPORTING_BASE_URL, DEFAULT_REQUEST_TIMEOUT,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "EC3_EXPORT";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_POLL_INTERVAL_MS: i64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub ec3_base_url: String,
    pub reporting_base_url: String,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub max_consecutive_failures: Option<u32>,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Default)]
pub struct Overrides {
    pub access_token: Option<String>,
    pub ec3_base_url: Option<String>,
    pub reporting_base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `--config` path must exist; the platform default is
    /// optional.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let file = match explicit {
            Some(path) => Some((expand_path(path), true)),
            None => default_config_path().map(|path| (path, false)),
        };
        Self::load_from(file, Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn load_from(file: Option<(PathBuf, bool)>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("ec3_base_url", DEFAULT_EC3_BASE_URL)?
            .set_default("reporting_base_url", DEFAULT_REPORTING_BASE_URL)?
            .set_default(
                "request_timeout_secs",
                DEFAULT_REQUEST_TIMEOUT.as_secs() as i64,
            )?
            .set_default("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?;

        if let Some((path, required)) = file {
            builder = builder.add_source(
                File::from(path.clone())
                    .format(FileFormat::Toml)
                    .required(required),
            );
            tracing::debug!(path = %path.display(), required, "Config file source");
        }

        let settings: Settings = builder
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if settings.max_consecutive_failures == Some(0) {
            bail!("max_consecutive_failures must be at least 1 (omit it to poll without a cap)");
        }
        Ok(settings)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(token) = overrides.access_token {
            self.access_token = Some(token);
        }
        if let Some(url) = overrides.ec3_base_url {
            self.ec3_base_url = url;
        }
        if let Some(url) = overrides.reporting_base_url {
            self.reporting_base_url = url;
        }
        if let Some(ms) = overrides.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
        self
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            ec3_base_url: self.ec3_base_url.clone(),
            reporting_base_url: self.reporting_base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_consecutive_failures: self.max_consecutive_failures,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "Bentley", "ec3-export")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}
