//! One-shot command line client for the content quality stack.
//!
//! Builds the same service graph as the server and runs a single
//! command against the remote source, so results match what the HTTP
//! API would return.

mod metrics;
mod report;
mod validate;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use cqrd_core::{AppConfig, MetricsPeriod};
use cqrd_quality::{MetricsAggregator, ValidationService};
use cqrd_report::{ReportCollector, TemplateRegistry};
use cqrd_source::SourceClient;

#[derive(Debug, Parser)]
#[command(name = "cqrd")]
#[command(about = "Content quality checks and report generation from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate content files or check links
    #[command(subcommand)]
    Validate(validate::ValidateCommands),
    /// Show quality metrics for one content item or the whole corpus
    Metrics {
        /// Content id to query; omit for the overall summary
        #[arg(long)]
        content_id: Option<String>,
        /// Trailing window: 24h, 7d, or 30d
        #[arg(long, default_value = "7d")]
        period: MetricsPeriod,
    },
    /// List report templates or generate a report
    #[command(subcommand)]
    Report(report::ReportCommands),
}

/// Service graph shared by every command, wired like the server's
/// composition root.
pub(crate) struct Services {
    pub(crate) validation: Arc<ValidationService>,
    pub(crate) metrics: Arc<MetricsAggregator>,
    pub(crate) registry: Arc<TemplateRegistry>,
    pub(crate) collector: Arc<ReportCollector>,
}

fn build_services(config: &AppConfig) -> anyhow::Result<Services> {
    let source = Arc::new(SourceClient::new(config)?);
    let validation = Arc::new(ValidationService::new(
        Arc::clone(&source),
        Duration::from_secs(config.validation_ttl_secs),
        Duration::from_secs(config.link_ttl_secs),
    ));
    let metrics = Arc::new(MetricsAggregator::new(
        Arc::clone(&source),
        Duration::from_secs(config.metrics_ttl_secs),
        Duration::from_secs(config.aggregate_ttl_secs),
    ));

    let registry = Arc::new(TemplateRegistry::with_builtins());
    if config.templates_path.exists() {
        let loaded = registry.load_yaml(&config.templates_path)?;
        tracing::debug!(
            count = loaded,
            path = %config.templates_path.display(),
            "loaded report templates"
        );
    }

    let collector = Arc::new(ReportCollector::new(
        Arc::clone(&metrics),
        Arc::clone(&validation),
    ));

    Ok(Services {
        validation,
        metrics,
        registry,
        collector,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cqrd_core::load_app_config()?;
    let services = build_services(&config)?;

    match cli.command {
        Commands::Validate(command) => validate::run(&services, command).await,
        Commands::Metrics { content_id, period } => {
            metrics::run_metrics(&services, content_id.as_deref(), period).await
        }
        Commands::Report(command) => report::run(&services, command).await,
    }
}
