//! Wire envelopes of the EC3 and reporting APIs

use ec3_export_core::domain::{report_id_from_href, CarbonUploadState, Configuration, Label, Report};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct Link {
    pub href: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageLinks {
    #[serde(default)]
    pub next: Option<Link>,
}

// ---- jobs ----

#[derive(Debug, Deserialize)]
pub(crate) struct JobEnvelope {
    pub job: JobDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobDto {
    pub id: String,
    #[serde(rename = "_links", default)]
    pub links: JobLinks,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobLinks {
    #[serde(default)]
    pub status: Option<Link>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobStatusEnvelope {
    pub job: JobStatusDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobStatusDto {
    pub status: CarbonUploadState,
    #[serde(rename = "_links", default)]
    pub links: JobStatusLinks,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobStatusLinks {
    #[serde(rename = "ec3Project", default)]
    pub ec3_project: Option<Link>,
}

// ---- configurations ----

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigurationEnvelope {
    pub configuration: ConfigurationDto,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfigurationsPage {
    #[serde(default)]
    pub configurations: Vec<ConfigurationDto>,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigurationDto {
    pub id: String,
    #[serde(rename = "iTwinId", default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(rename = "_links", default)]
    pub links: ConfigurationLinks,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigurationLinks {
    #[serde(default)]
    pub report: Option<Link>,
}

impl From<ConfigurationDto> for Configuration {
    fn from(dto: ConfigurationDto) -> Self {
        let report_id = dto
            .links
            .report
            .as_ref()
            .and_then(|link| report_id_from_href(&link.href))
            .unwrap_or_default();
        Configuration {
            id: Some(dto.id),
            project_id: dto.project_id,
            display_name: dto.display_name,
            description: dto.description,
            report_id,
            labels: dto.labels,
        }
    }
}

/// Body of configuration create/update
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfigurationWrite<'a> {
    #[serde(rename = "iTwinId", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<&'a str>,
    pub display_name: &'a str,
    pub description: &'a str,
    pub report_id: &'a str,
    pub labels: &'a [Label],
}

impl<'a> From<&'a Configuration> for ConfigurationWrite<'a> {
    fn from(cfg: &'a Configuration) -> Self {
        Self {
            project_id: cfg.project_id.as_deref(),
            display_name: &cfg.display_name,
            description: &cfg.description,
            report_id: &cfg.report_id,
            labels: &cfg.labels,
        }
    }
}

// ---- reports ----

#[derive(Debug, Deserialize)]
pub(crate) struct ReportsPage {
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
}
