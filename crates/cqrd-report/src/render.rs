//! Report assembly and format encoding.
//!
//! Rendering turns collected section data into a [`ReportDocument`], encodes
//! it in the requested output format, and wraps the result in a
//! [`GeneratedReport`] envelope. The JSON document is the canonical payload;
//! binary office formats carry it tagged with their MIME type until a real
//! layout engine replaces them.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::collect::ReportCollector;
use crate::error::ReportError;
use crate::types::{
    DocumentSection, GenerateOptions, GeneratedReport, ReportDocument, ReportFormat,
    ReportTemplate, SectionData, SectionKind,
};

/// A fully rendered report: envelope, document, and encoded payload.
pub struct RenderedReport {
    pub report: GeneratedReport,
    pub document: ReportDocument,
    pub payload: Vec<u8>,
}

/// Collects section data for `template` and renders it in one step.
///
/// The reporting period is pinned before collection so the envelope and the
/// collected data describe the same window even when the caller left the
/// period unset.
pub async fn generate(
    collector: &ReportCollector,
    template: &ReportTemplate,
    options: &GenerateOptions,
) -> Result<RenderedReport, ReportError> {
    let mut options = options.clone();
    options.period = Some(options.period_or_default(Utc::now()));
    let collected = collector.collect(template, &options).await;
    render(template, &collected, &options)
}

/// Renders already-collected section data into a report.
pub fn render(
    template: &ReportTemplate,
    collected: &HashMap<String, SectionData>,
    options: &GenerateOptions,
) -> Result<RenderedReport, ReportError> {
    let format = options.format.unwrap_or(template.output_format);
    let generated_at = Utc::now();
    let period = options.period_or_default(generated_at);

    let sections: Vec<DocumentSection> = template
        .sections
        .iter()
        .map(|section| {
            let payload = collected
                .get(&section.id)
                .map(|data| data.payload.clone())
                .unwrap_or_else(|| json!({"error": "no data collected for section"}));
            DocumentSection {
                id: section.id.clone(),
                title: section.title.clone(),
                kind: section.kind,
                payload,
            }
        })
        .collect();

    let document = ReportDocument {
        template_id: template.id.clone(),
        template_name: template.name.clone(),
        generated_at,
        period,
        sections,
    };

    let payload = encode(&document, format)?;
    let id = Uuid::new_v4();
    let report = GeneratedReport {
        id,
        template_id: template.id.clone(),
        generated_at,
        format,
        size_bytes: payload.len(),
        download_ref: format!("/api/v1/reports/{id}/download"),
        period,
        section_count: template.sections.len(),
        chart_count: count_kind(template, SectionKind::Chart),
        table_count: count_kind(template, SectionKind::Table),
    };

    Ok(RenderedReport {
        report,
        document,
        payload,
    })
}

pub(crate) fn encode(
    document: &ReportDocument,
    format: ReportFormat,
) -> Result<Vec<u8>, ReportError> {
    match format {
        ReportFormat::Csv => Ok(encode_csv(document)?.into_bytes()),
        ReportFormat::Json
        | ReportFormat::Pdf
        | ReportFormat::Excel
        | ReportFormat::Powerpoint => Ok(serde_json::to_vec_pretty(document)?),
    }
}

/// One row per section. Payloads are embedded as compact JSON cells.
fn encode_csv(document: &ReportDocument) -> Result<String, ReportError> {
    let mut out = String::from("section_id,title,kind,payload\r\n");
    for section in &document.sections {
        let row = [
            csv_field(&section.id),
            csv_field(&section.title),
            csv_field(section.kind.as_str()),
            csv_field(&serde_json::to_string(&section.payload)?),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    Ok(out)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

fn count_kind(template: &ReportTemplate, kind: SectionKind) -> usize {
    template
        .sections
        .iter()
        .filter(|s| s.kind == kind)
        .count()
}
