// EC3 Template (configuration) Domain Model

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};

const REPORTS_SEGMENT: &str = "/reports/";

/// Material column mapping of a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub name_column: String,
}

/// Label: maps one report table onto EC3 elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    #[serde(default)]
    pub name: String,
    pub report_table: String,
    pub element_name_column: String,
    pub element_quantity_column: String,
    #[serde(default)]
    pub materials: Vec<Material>,
}

impl Label {
    /// Title shown for the label; unnamed labels fall back to their table
    pub fn title(&self) -> &str {
        if self.name.is_empty() {
            &self.report_table
        } else {
            &self.name
        }
    }
}

/// EC3 template (configuration)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Owning project (iTwin)
    #[serde(rename = "iTwinId", default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub report_id: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Configuration {
    pub fn new(display_name: impl Into<String>, report_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            report_id: report_id.into(),
            ..Default::default()
        }
    }

    /// Save is only allowed once a name and a report are set
    pub fn validate(&self) -> Result<()> {
        if self.display_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Template name cannot be empty".to_string(),
            ));
        }
        if self.report_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Template must reference a report".to_string(),
            ));
        }
        Ok(())
    }

    /// Insert a label, replacing the one mapped to the same report table
    pub fn upsert_label(&mut self, label: Label) {
        match self
            .labels
            .iter_mut()
            .find(|l| l.report_table == label.report_table)
        {
            Some(existing) => *existing = label,
            None => self.labels.push(label),
        }
    }

    /// Remove the label mapped to `report_table`; returns whether one was removed
    pub fn remove_label(&mut self, report_table: &str) -> bool {
        let before = self.labels.len();
        self.labels.retain(|l| l.report_table != report_table);
        self.labels.len() != before
    }

    /// Point the template at another report.
    ///
    /// Labels reference tables of the old report, so they are dropped when
    /// the report actually changes. Returns whether labels were cleared.
    pub fn change_report(&mut self, report_id: impl Into<String>) -> bool {
        let report_id = report_id.into();
        if report_id == self.report_id {
            return false;
        }
        self.report_id = report_id;
        let cleared = !self.labels.is_empty();
        self.labels.clear();
        cleared
    }
}

/// Extract the report id from a report link (`.../reports/{id}`)
pub fn report_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once(REPORTS_SEGMENT)?;
    let id = rest.split(['/', '?']).next().unwrap_or_default();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Reporting report (source of label tables)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

/// Order reports the way a picker lists them: by display name,
/// case-insensitively, ties broken case-sensitively
pub fn sort_reports(reports: &mut [Report]) {
    reports.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(table: &str, name: &str) -> Label {
        Label {
            name: name.to_string(),
            report_table: table.to_string(),
            element_name_column: "Name".to_string(),
            element_quantity_column: "Volume".to_string(),
            materials: vec![Material {
                name_column: "Material".to_string(),
            }],
        }
    }

    #[test]
    fn test_validate_requires_name_and_report() {
        assert!(Configuration::new("", "r1").validate().is_err());
        assert!(Configuration::new("Walls", "").validate().is_err());
        assert!(Configuration::new("Walls", "r1").validate().is_ok());
    }

    #[test]
    fn test_upsert_replaces_by_report_table() {
        let mut cfg = Configuration::new("Walls", "r1");
        cfg.upsert_label(label("Walls_Table", "Walls"));
        cfg.upsert_label(label("Slabs_Table", ""));
        cfg.upsert_label(label("Walls_Table", "Exterior walls"));

        assert_eq!(cfg.labels.len(), 2);
        assert_eq!(cfg.labels[0].name, "Exterior walls");
        assert_eq!(cfg.labels[1].title(), "Slabs_Table");
    }

    #[test]
    fn test_remove_label() {
        let mut cfg = Configuration::new("Walls", "r1");
        cfg.upsert_label(label("Walls_Table", "Walls"));

        assert!(!cfg.remove_label("Missing"));
        assert!(cfg.remove_label("Walls_Table"));
        assert!(cfg.labels.is_empty());
    }

    #[test]
    fn test_change_report_clears_labels_only_on_change() {
        let mut cfg = Configuration::new("Walls", "r1");
        cfg.upsert_label(label("Walls_Table", "Walls"));

        assert!(!cfg.change_report("r1"));
        assert_eq!(cfg.labels.len(), 1);

        assert!(cfg.change_report("r2"));
        assert_eq!(cfg.report_id, "r2");
        assert!(cfg.labels.is_empty());
    }

    #[test]
    fn test_report_id_from_href() {
        assert_eq!(
            report_id_from_href("https://api.bentley.com/insights/reporting/reports/abc-123"),
            Some("abc-123".to_string())
        );
        assert_eq!(
            report_id_from_href("https://host/reports/abc?x=1"),
            Some("abc".to_string())
        );
        assert_eq!(report_id_from_href("https://host/reports/"), None);
        assert_eq!(report_id_from_href("https://host/mappings/abc"), None);
    }

    #[test]
    fn test_sort_reports_by_display_name() {
        let report = |id: &str, name: &str| Report {
            id: id.to_string(),
            display_name: name.to_string(),
            description: None,
            deleted: false,
        };
        let mut reports = vec![report("1", "beta"), report("2", "Alpha"), report("3", "alpha")];
        sort_reports(&mut reports);

        let names: Vec<_> = reports.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta"]);
    }
}
