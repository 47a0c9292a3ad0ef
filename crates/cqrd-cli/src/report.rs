//! `report` subcommands: template listing and one-shot generation.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;

use cqrd_report::{generate, GenerateOptions, ReportFormat};

use crate::Services;

#[derive(Debug, Subcommand)]
pub(crate) enum ReportCommands {
    /// List the registered report templates
    Templates,
    /// Generate a report and write the artifact to disk
    Generate {
        /// Template id to render
        #[arg(long)]
        template: String,
        /// Output format override: pdf, excel, powerpoint, json, or csv
        #[arg(long)]
        format: Option<ReportFormat>,
        /// Output path; defaults to report-<id>.<ext> in the current
        /// directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

pub(crate) async fn run(services: &Services, command: ReportCommands) -> anyhow::Result<()> {
    match command {
        ReportCommands::Templates => {
            run_templates(services);
            Ok(())
        }
        ReportCommands::Generate {
            template,
            format,
            out,
        } => run_generate(services, &template, format, out).await,
    }
}

fn run_templates(services: &Services) {
    let templates = services.registry.list_templates();
    println!("{:<22}{:<12}{:<12}SECTIONS", "ID", "TYPE", "FORMAT");
    for template in &templates {
        println!(
            "{:<22}{:<12}{:<12}{}",
            template.id,
            template.kind,
            template.output_format.as_str(),
            template.sections.len(),
        );
    }
}

/// Renders one report, writes the payload to disk and prints the
/// envelope.
///
/// # Errors
///
/// Returns an error when the template id is unknown, rendering fails,
/// or the artifact cannot be written.
async fn run_generate(
    services: &Services,
    template_id: &str,
    format: Option<ReportFormat>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let template = services.registry.get_template(template_id).ok_or_else(|| {
        anyhow::anyhow!("template '{template_id}' not found; run `cqrd report templates` to list ids")
    })?;

    let options = GenerateOptions {
        format,
        ..GenerateOptions::default()
    };
    let rendered = generate(&services.collector, &template, &options).await?;
    let report = &rendered.report;

    let path = out.unwrap_or_else(|| {
        PathBuf::from(format!(
            "report-{}.{}",
            report.id,
            report.format.file_extension()
        ))
    });
    std::fs::write(&path, &rendered.payload)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Report:    {}", report.id);
    println!("Template:  {} ({})", report.template_id, template.name);
    println!("Format:    {} ({})", report.format.as_str(), report.format.mime_type());
    println!(
        "Period:    {} to {}",
        report.period.start.format("%Y-%m-%d"),
        report.period.end.format("%Y-%m-%d"),
    );
    println!(
        "Sections:  {} ({} charts, {} tables)",
        report.section_count, report.chart_count, report.table_count,
    );
    println!("Size:      {} bytes", report.size_bytes);
    println!("Wrote:     {}", path.display());
    Ok(())
}
