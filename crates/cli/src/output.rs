//! Terminal rendering

use colored::Colorize;
use ec3_export_core::application::PollerSnapshot;
use ec3_export_core::domain::{Configuration, ExportDisplay, ExportJob, JobStatusReport, Report};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ReportRow {
    id: String,
    name: String,
    description: String,
}

#[derive(Tabled)]
struct TemplateRow {
    id: String,
    name: String,
    report: String,
    labels: usize,
}

#[derive(Tabled)]
struct LabelRow {
    label: String,
    table: String,
    element: String,
    quantity: String,
    materials: String,
}

pub fn print_job(job: &ExportJob) {
    println!("{}", "✓ Export job created".green().bold());
    println!("  {} {}", "Job ID:".bold(), job.id);
    println!("  {} {}", "Status URL:".bold(), job.status_locator);
}

pub fn print_display(display: &ExportDisplay) {
    let line = match display {
        d if d.is_pending() => d.message().yellow(),
        ExportDisplay::Failed => display.message().red().bold(),
        _ => display.message().green().bold(),
    };
    println!("{}", line);

    if let (Some(action), ExportDisplay::Succeeded { link: Some(link) }) =
        (display.action_label(), display)
    {
        println!("  {} {}", format!("{}:", action).bold(), link.underline());
    }
}

pub fn print_status(job_id: &str, report: &JobStatusReport) {
    println!("  {} {}", "Job ID:".bold(), job_id);
    println!("  {} {}", "Status:".bold(), report.status);
    print_display(&ExportDisplay::from_report(Some(report)));
}

pub fn print_outcome(snapshot: &PollerSnapshot) {
    println!(
        "  {} {} ({} queries)",
        "Polling:".bold(),
        snapshot.state,
        snapshot.queries_issued
    );
}

pub fn print_reports(reports: Vec<Report>) {
    if reports.is_empty() {
        println!("{}", "No reports found".yellow());
        return;
    }
    let rows: Vec<ReportRow> = reports
        .into_iter()
        .map(|r| ReportRow {
            id: r.id,
            name: r.display_name,
            description: r.description.unwrap_or_default(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn print_templates(templates: Vec<Configuration>) {
    if templates.is_empty() {
        println!("{}", "No templates found".yellow());
        return;
    }
    let rows: Vec<TemplateRow> = templates
        .into_iter()
        .map(|t| TemplateRow {
            id: t.id.unwrap_or_default(),
            labels: t.labels.len(),
            name: t.display_name,
            report: t.report_id,
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn print_template(template: &Configuration) {
    println!("{}", template.display_name.cyan().bold());
    println!("  {} {}", "ID:".bold(), template.id.as_deref().unwrap_or("-"));
    println!("  {} {}", "Report:".bold(), template.report_id);
    if !template.description.is_empty() {
        println!("  {} {}", "Description:".bold(), template.description);
    }
    println!();

    if template.labels.is_empty() {
        println!("{}", "No labels".yellow());
        return;
    }
    let rows: Vec<LabelRow> = template
        .labels
        .iter()
        .map(|l| LabelRow {
            label: l.title().to_string(),
            table: l.report_table.clone(),
            element: l.element_name_column.clone(),
            quantity: l.element_quantity_column.clone(),
            materials: l
                .materials
                .iter()
                .map(|m| m.name_column.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();
    println!("{}", Table::new(rows));
}
