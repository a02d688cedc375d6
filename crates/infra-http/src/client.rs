//! Shared HTTP transport: base URLs, headers, error mapping

use ec3_export_core::domain::AccessToken;
use ec3_export_core::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use crate::dto::Link;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Media type required by the platform APIs
pub const PLATFORM_ACCEPT: &str = "application/vnd.bentley.itwin-platform.v1+json";

pub const DEFAULT_EC3_BASE_URL: &str = "https://api.bentley.com/insights/carbon-calculation/ec3/";
pub const DEFAULT_REPORTING_BASE_URL: &str = "https://api.bentley.com/insights/reporting/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub ec3_base_url: String,
    pub reporting_base_url: String,
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            ec3_base_url: DEFAULT_EC3_BASE_URL.to_string(),
            reporting_base_url: DEFAULT_REPORTING_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// One reqwest client plus parsed base URLs, shared by all adapters
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    ec3_base: Url,
    reporting_base: Url,
}

impl HttpTransport {
    pub fn new(config: &HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(PLATFORM_ACCEPT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            ec3_base: parse_base(&config.ec3_base_url)?,
            reporting_base: parse_base(&config.reporting_base_url)?,
        })
    }

    pub fn ec3_base(&self) -> &Url {
        &self.ec3_base
    }

    pub(crate) fn ec3_url(&self, path: &str) -> Result<Url> {
        join(&self.ec3_base, path)
    }

    pub(crate) fn reporting_url(&self, path: &str) -> Result<Url> {
        join(&self.reporting_base, path)
    }

    pub(crate) fn get(&self, url: Url, token: &AccessToken) -> RequestBuilder {
        authorize(self.client.get(url), token)
    }

    pub(crate) fn post(&self, url: Url, token: &AccessToken) -> RequestBuilder {
        authorize(self.client.post(url), token)
    }

    pub(crate) fn put(&self, url: Url, token: &AccessToken) -> RequestBuilder {
        authorize(self.client.put(url), token)
    }

    pub(crate) fn delete(&self, url: Url, token: &AccessToken) -> RequestBuilder {
        authorize(self.client.delete(url), token)
    }

    /// Send and decode a JSON body
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send, mapping transport failures and non-2xx statuses to `AppError`
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "HTTP response");

        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

fn authorize(request: RequestBuilder, token: &AccessToken) -> RequestBuilder {
    request.header(AUTHORIZATION, token.authorization_header())
}

/// Base URLs must end with `/` for relative joins to append
fn parse_base(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized)
        .map_err(|e| AppError::Config(format!("Invalid base URL {}: {}", raw, e)))
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path)
        .map_err(|e| AppError::Internal(format!("Invalid URL {}{}: {}", base, path, e)))
}

/// Tracks pages already fetched so a cyclic `next` link cannot loop forever
#[derive(Default)]
pub(crate) struct Pager {
    visited: HashSet<Url>,
}

impl Pager {
    /// Record `url` as fetched; fails if it was fetched before
    pub(crate) fn visit(&mut self, url: &Url) -> Result<()> {
        if !self.visited.insert(url.clone()) {
            return Err(AppError::Internal(format!(
                "Pagination loop: {} was already fetched",
                url
            )));
        }
        Ok(())
    }

    /// Parse the next page link, if any
    pub(crate) fn next(&self, link: Option<Link>) -> Result<Option<Url>> {
        link.map(|link| Url::parse(&link.href))
            .transpose()
            .map_err(|e| AppError::Internal(format!("Invalid next link: {}", e)))
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Transport(e.to_string())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Map a non-2xx response onto the error taxonomy
pub(crate) fn status_error(status: StatusCode, body: &str) -> AppError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.code {
            Some(code) => format!("{}: {}", code, envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Unauthorized(message),
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        _ => AppError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
