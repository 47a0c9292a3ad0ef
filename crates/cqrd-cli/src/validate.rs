//! `validate` subcommands: one-shot content and link checks.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;

use cqrd_core::ContentType;
use cqrd_quality::types::LinkCheckOptions;

use crate::Services;

#[derive(Debug, Subcommand)]
pub(crate) enum ValidateCommands {
    /// Validate a content file against the quality rules
    Content {
        /// Path of the file to validate
        #[arg(long)]
        file: PathBuf,
        /// Content type: markdown, html, or text
        #[arg(long, default_value = "markdown")]
        content_type: ContentType,
        /// Restrict the run to one rule id; repeatable
        #[arg(long = "rule")]
        rules: Vec<String>,
    },
    /// Check a set of URLs for broken links
    Links {
        /// URL to check; repeatable
        #[arg(long = "url", required = true)]
        urls: Vec<String>,
        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout_ms: u64,
    },
}

pub(crate) async fn run(services: &Services, command: ValidateCommands) -> anyhow::Result<()> {
    match command {
        ValidateCommands::Content {
            file,
            content_type,
            rules,
        } => run_content(services, &file, content_type, &rules).await,
        ValidateCommands::Links { urls, timeout_ms } => {
            run_links(services, &urls, timeout_ms).await;
            Ok(())
        }
    }
}

/// Validates one file and prints the score, issue table and
/// suggestions.
///
/// # Errors
///
/// Returns an error when the file cannot be read. The validation call
/// itself never fails; a source outage degrades to the advisory
/// fallback result.
async fn run_content(
    services: &Services,
    file: &Path,
    content_type: ContentType,
    rules: &[String],
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let rules = (!rules.is_empty()).then_some(rules);

    let result = services
        .validation
        .validate_content(&content, content_type, rules, None, true)
        .await;

    let verdict = if result.is_valid { "pass" } else { "fail" };
    println!("File:  {}", file.display());
    println!("Type:  {content_type}");
    println!("Score: {:.1} ({verdict})", result.score);
    println!(
        "Subscores: readability {:.0}, seo {:.0}, accessibility {:.0}, quality {:.0}",
        result.subscores.readability,
        result.subscores.seo,
        result.subscores.accessibility,
        result.subscores.quality,
    );

    if result.issues.is_empty() {
        println!();
        println!("no issues found");
    } else {
        println!();
        println!("{:<10}{:<28}{:<7}MESSAGE", "SEVERITY", "RULE", "LINE");
        for issue in &result.issues {
            println!(
                "{:<10}{:<28}{:<7}{}",
                issue.severity.as_str(),
                issue.rule,
                fmt_line(issue.line),
                issue.message,
            );
        }
    }

    if !result.suggestions.is_empty() {
        println!();
        for suggestion in &result.suggestions {
            println!("suggestion: {suggestion}");
        }
    }

    Ok(())
}

/// Checks the given URLs and prints one row per result plus the count
/// summary. Never fails; unreachable sources degrade to pending rows.
async fn run_links(services: &Services, urls: &[String], timeout_ms: u64) {
    let options = LinkCheckOptions {
        timeout_ms,
        ..LinkCheckOptions::default()
    };
    let result = services.validation.validate_links(urls, &options).await;

    println!("{:<10}{:<7}URL", "STATUS", "CODE");
    for row in &result.results {
        let code = row
            .status_code
            .map_or_else(|| "\u{2014}".to_owned(), |c| c.to_string());
        println!("{:<10}{:<7}{}", row.status.as_str(), code, row.url);
    }

    let summary = result.summary;
    println!();
    println!(
        "{} checked: {} valid, {} invalid, {} warnings",
        summary.total, summary.valid, summary.invalid, summary.warnings,
    );
    if summary.invalid > 0 {
        eprintln!("warning: {} link(s) failed the check", summary.invalid);
    }
}

fn fmt_line(line: Option<u32>) -> String {
    line.map_or_else(|| "\u{2014}".to_owned(), |l| l.to_string())
}

#[cfg(test)]
mod tests {
    use super::fmt_line;

    #[test]
    fn missing_line_numbers_render_as_a_dash() {
        assert_eq!(fmt_line(None), "\u{2014}");
        assert_eq!(fmt_line(Some(42)), "42");
    }
}
