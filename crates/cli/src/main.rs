//! ec3-export - submit EC3 carbon exports and manage their templates

mod commands;
mod output;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::App;
use settings::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "ec3-export")]
#[command(about = "Export iTwin reports to EC3 and manage export templates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: platform config dir, config.toml)
    #[arg(long, global = true, env = "EC3_EXPORT_CONFIG")]
    config: Option<String>,

    /// Platform access token
    #[arg(long, global = true, env = "EC3_EXPORT_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// EC3 service base URL
    #[arg(long, global = true)]
    ec3_base_url: Option<String>,

    /// Reporting service base URL
    #[arg(long, global = true)]
    reporting_base_url: Option<String>,

    /// Status poll interval in milliseconds
    #[arg(long, global = true)]
    poll_interval_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an export job and follow it to completion
    Export {
        /// Template (EC3 configuration) id
        #[arg(short, long)]
        template_id: String,

        /// Name of the project created in EC3
        #[arg(short, long)]
        project_name: String,

        /// EC3 bearer token
        #[arg(long, env = "EC3_EXPORT_EC3_TOKEN", hide_env_values = true)]
        ec3_token: String,

        /// Seconds until the EC3 token expires
        #[arg(long, default_value = "3600")]
        ec3_token_expires_in: u64,

        /// Return after the job is created
        #[arg(long)]
        no_wait: bool,
    },

    /// Query a job's status once
    Status {
        job_id: String,

        /// Status URL returned at creation
        #[arg(long)]
        status_url: Option<String>,
    },

    /// Poll an existing job until it finishes
    Watch {
        job_id: String,

        #[arg(long)]
        status_url: Option<String>,
    },

    /// List the reports of a project
    Reports { project_id: String },

    /// Manage export templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List the templates of a project
    List { project_id: String },

    /// Show one template with its labels
    Show { id: String },

    /// Create or update a template from a JSON file
    Save {
        file: PathBuf,

        /// Project to create the template in
        #[arg(long)]
        project_id: Option<String>,
    },

    /// Delete a template
    Delete { id: String },
}

fn init_logging() {
    let log_format =
        std::env::var("EC3_EXPORT_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ec3_export=info"));

    // stderr keeps command output pipeable
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(Overrides {
        access_token: cli.access_token,
        ec3_base_url: cli.ec3_base_url,
        reporting_base_url: cli.reporting_base_url,
        poll_interval_ms: cli.poll_interval_ms,
    });
    debug!(
        ec3_base_url = %settings.ec3_base_url,
        reporting_base_url = %settings.reporting_base_url,
        poll_interval_ms = settings.poll_interval_ms,
        "Settings loaded"
    );

    let app = App::new(&settings)?;

    match cli.command {
        Commands::Export {
            template_id,
            project_name,
            ec3_token,
            ec3_token_expires_in,
            no_wait,
        } => {
            app.export(
                template_id,
                project_name,
                ec3_token,
                ec3_token_expires_in,
                !no_wait,
            )
            .await?
        }
        Commands::Status { job_id, status_url } => {
            app.status(&job_id, status_url.as_deref()).await?
        }
        Commands::Watch { job_id, status_url } => {
            app.watch(&job_id, status_url.as_deref()).await?
        }
        Commands::Reports { project_id } => app.reports(&project_id).await?,
        Commands::Templates { command } => match command {
            TemplatesCommand::List { project_id } => app.list_templates(&project_id).await?,
            TemplatesCommand::Show { id } => app.show_template(&id).await?,
            TemplatesCommand::Save { file, project_id } => {
                app.save_template(&file, project_id).await?
            }
            TemplatesCommand::Delete { id } => app.delete_template(&id).await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "ec3-export",
            "export",
            "--template-id",
            "cfg-1",
            "--project-name",
            "Tower",
            "--ec3-token",
            "ec3",
            "--no-wait",
        ])
        .unwrap();

        match cli.command {
            Commands::Export {
                template_id,
                ec3_token_expires_in,
                no_wait,
                ..
            } => {
                assert_eq!(template_id, "cfg-1");
                assert_eq!(ec3_token_expires_in, 3600);
                assert!(no_wait);
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_parse_templates_show() {
        let cli = Cli::try_parse_from(["ec3-export", "templates", "show", "cfg-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Templates {
                command: TemplatesCommand::Show { .. }
            }
        ));
    }
}
