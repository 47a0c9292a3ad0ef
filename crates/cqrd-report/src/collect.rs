//! Report data collection.
//!
//! Each template section names a data source; collection dispatches to the
//! matching service and gathers every section concurrently. Sections are
//! isolated: one failing data source becomes an error marker in that
//! section's slot while the rest of the report proceeds.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;

use cqrd_core::Aggregation;
use cqrd_quality::types::{LinkCheckOptions, MetricsFilter, Period};
use cqrd_quality::{MetricsAggregator, ValidationService};

use crate::error::ReportError;
use crate::types::{GenerateOptions, ReportPeriod, ReportSection, ReportTemplate, SectionData};

pub struct ReportCollector {
    metrics: Arc<MetricsAggregator>,
    validation: Arc<ValidationService>,
}

impl ReportCollector {
    #[must_use]
    pub fn new(metrics: Arc<MetricsAggregator>, validation: Arc<ValidationService>) -> Self {
        Self {
            metrics,
            validation,
        }
    }

    /// Collects data for every section of `template`.
    ///
    /// Returns a map from section id to the collected payload. This never
    /// fails as a whole: a section whose source errors gets
    /// `{"error": "<message>"}` as its payload and the rest continue.
    pub async fn collect(
        &self,
        template: &ReportTemplate,
        options: &GenerateOptions,
    ) -> HashMap<String, SectionData> {
        let period = options.period_or_default(chrono::Utc::now());
        let custom = &options.custom_data;

        let sections = template.sections.iter().map(|section| async move {
            let payload = match self.collect_section(section, period, custom).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(
                        section = %section.id,
                        data_source = %section.data_source,
                        error = %e,
                        "section collection failed"
                    );
                    json!({"error": e.to_string()})
                }
            };
            (
                section.id.clone(),
                SectionData {
                    title: section.title.clone(),
                    kind: section.kind,
                    payload,
                },
            )
        });

        join_all(sections).await.into_iter().collect()
    }

    async fn collect_section(
        &self,
        section: &ReportSection,
        period: ReportPeriod,
        custom: &HashMap<String, serde_json::Value>,
    ) -> Result<serde_json::Value, ReportError> {
        match section.data_source.as_str() {
            // Full aggregate including the per-day bucket series, for charts
            // and tables.
            "analytics" => {
                let aggregated = self.metrics.get_aggregated(&range_filter(period)).await?;
                Ok(serde_json::to_value(&aggregated)?)
            }
            // Same aggregate query as an analytics section, projected down
            // to the overall rollup.
            "content" => {
                let aggregated = self.metrics.get_aggregated(&range_filter(period)).await?;
                Ok(json!({
                    "overall": aggregated.overall,
                    "sample_count": aggregated.sample_count,
                    "trend": aggregated.trend,
                }))
            }
            "links" => {
                let urls = section_urls(section)?;
                let result = self
                    .validation
                    .validate_links(&urls, &LinkCheckOptions::default())
                    .await;
                Ok(serde_json::to_value(&result)?)
            }
            "custom" => Ok(custom
                .get(&section.id)
                .cloned()
                .unwrap_or_else(|| placeholder("custom"))),
            other => {
                tracing::warn!(
                    section = %section.id,
                    data_source = other,
                    "unknown data source, emitting placeholder"
                );
                Ok(placeholder(other))
            }
        }
    }
}

fn range_filter(period: ReportPeriod) -> MetricsFilter {
    MetricsFilter {
        period: Period::Custom,
        start_date: Some(period.start),
        end_date: Some(period.end),
        content_types: None,
        aggregation: Aggregation::Day,
    }
}

fn section_urls(section: &ReportSection) -> Result<Vec<String>, ReportError> {
    let urls: Vec<String> = section
        .config
        .get("urls")
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default();
    if urls.is_empty() {
        return Err(ReportError::InvalidTemplate(format!(
            "links section '{}' has no urls configured",
            section.id
        )));
    }
    Ok(urls)
}

fn placeholder(data_source: &str) -> serde_json::Value {
    json!({"placeholder": true, "data_source": data_source})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SectionKind;

    fn links_section(config: serde_json::Value) -> ReportSection {
        ReportSection {
            id: "status".to_owned(),
            title: "Link Status".to_owned(),
            kind: SectionKind::Table,
            data_source: "links".to_owned(),
            config,
            order: 1,
        }
    }

    #[test]
    fn section_urls_reads_the_config_array() {
        let section = links_section(json!({"urls": ["https://a.test/", "https://b.test/"]}));
        let urls = section_urls(&section).expect("urls should parse");
        assert_eq!(urls, ["https://a.test/", "https://b.test/"]);
    }

    #[test]
    fn section_urls_rejects_missing_and_empty_configs() {
        assert!(section_urls(&links_section(serde_json::Value::Null)).is_err());
        assert!(section_urls(&links_section(json!({"urls": []}))).is_err());
        // Non-string entries are dropped; all-invalid collapses to empty.
        assert!(section_urls(&links_section(json!({"urls": [1, 2]}))).is_err());
    }

    #[test]
    fn range_filter_carries_explicit_dates() {
        let period = ReportPeriod {
            start: "2026-07-23T00:00:00Z".parse().unwrap(),
            end: "2026-08-22T00:00:00Z".parse().unwrap(),
        };
        let filter = range_filter(period);
        assert_eq!(filter.period, Period::Custom);
        assert_eq!(filter.start_date, Some(period.start));
        assert_eq!(filter.end_date, Some(period.end));
        assert_eq!(filter.aggregation, Aggregation::Day);
    }

    #[test]
    fn placeholder_names_the_data_source() {
        let value = placeholder("weather");
        assert_eq!(value["placeholder"], true);
        assert_eq!(value["data_source"], "weather");
    }
}
