//! Data shapes for report templates, generated reports, and exports.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rendering role of one template section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Chart,
    Table,
    Text,
    Metrics,
    Kpi,
    Trend,
}

impl SectionKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Chart => "chart",
            SectionKind::Table => "table",
            SectionKind::Text => "text",
            SectionKind::Metrics => "metrics",
            SectionKind::Kpi => "kpi",
            SectionKind::Trend => "trend",
        }
    }
}

/// Output format of a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Excel,
    Powerpoint,
    Json,
    Csv,
}

impl ReportFormat {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Excel => "excel",
            ReportFormat::Powerpoint => "powerpoint",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ReportFormat::Powerpoint => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            ReportFormat::Json => "application/json",
            ReportFormat::Csv => "text/csv",
        }
    }

    #[must_use]
    pub fn file_extension(self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Excel => "xlsx",
            ReportFormat::Powerpoint => "pptx",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(ReportFormat::Pdf),
            "excel" => Ok(ReportFormat::Excel),
            "powerpoint" => Ok(ReportFormat::Powerpoint),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!(
                "unknown report format '{other}'; expected pdf, excel, powerpoint, json, or csv"
            )),
        }
    }
}

/// Formats a stored report can be re-exported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    Excel,
}

impl From<ExportFormat> for ReportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => ReportFormat::Json,
            ExportFormat::Csv => ReportFormat::Csv,
            ExportFormat::Excel => ReportFormat::Excel,
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "excel" => Ok(ExportFormat::Excel),
            other => Err(format!(
                "unknown export format '{other}'; expected json, csv, or excel"
            )),
        }
    }
}

/// One unit of report content, bound to a data source.
///
/// `order` values need not be contiguous but must be unique within a
/// template; sections are stored and rendered in `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub data_source: String,
    #[serde(default)]
    pub config: serde_json::Value,
    pub order: u32,
}

/// Caller-supplied template definition, before an id is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sections: Vec<ReportSection>,
    pub output_format: ReportFormat,
}

/// A registered, validated report template. Sections are sorted by `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub sections: Vec<ReportSection>,
    pub output_format: ReportFormat,
}

/// Explicit date window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    /// Trailing window of `days` ending at `now`.
    #[must_use]
    pub fn trailing(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            start: now - chrono::Duration::days(days),
            end: now,
        }
    }
}

/// Options for one report generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<ReportPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
    /// Payloads for sections with the `custom` data source, keyed by
    /// section id.
    #[serde(default)]
    pub custom_data: HashMap<String, serde_json::Value>,
}

impl GenerateOptions {
    /// The requested period, defaulting to the trailing 30 days ending at
    /// `now`.
    #[must_use]
    pub fn period_or_default(&self, now: DateTime<Utc>) -> ReportPeriod {
        self.period.unwrap_or_else(|| ReportPeriod::trailing(30, now))
    }
}

/// Collected payload for one section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionData {
    pub title: String,
    pub kind: SectionKind,
    pub payload: serde_json::Value,
}

/// One section of the canonical report document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSection {
    pub id: String,
    pub title: String,
    pub kind: SectionKind,
    pub payload: serde_json::Value,
}

/// The canonical rendered document: metadata plus sections in template
/// order. Format encoders consume this; the JSON encoding of this struct is
/// also the byte payload for formats whose real layout lives downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub template_id: String,
    pub template_name: String,
    pub generated_at: DateTime<Utc>,
    pub period: ReportPeriod,
    pub sections: Vec<DocumentSection>,
}

/// Envelope describing one generated report artifact. Immutable once
/// created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub id: Uuid,
    pub template_id: String,
    pub generated_at: DateTime<Utc>,
    pub format: ReportFormat,
    pub size_bytes: usize,
    pub download_ref: String,
    pub period: ReportPeriod,
    pub section_count: usize,
    pub chart_count: usize,
    pub table_count: usize,
}

/// A stored report re-encoded for export.
#[derive(Debug, Clone, Serialize)]
pub struct ReportExport {
    pub data: String,
    pub filename: String,
    pub mime_type: String,
}
