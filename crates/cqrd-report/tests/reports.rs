//! End-to-end report generation against a mock source.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cqrd_quality::{MetricsAggregator, ValidationService};
use cqrd_report::types::{ReportPeriod, ReportSection, SectionKind};
use cqrd_report::{
    generate, ExportFormat, GenerateOptions, ReportCollector, ReportError, ReportFormat,
    ReportStore, ReportTemplate, TemplateDefinition, TemplateRegistry,
};
use cqrd_source::SourceClient;

fn collector(base_url: &str) -> ReportCollector {
    let source = Arc::new(
        SourceClient::with_base_url(base_url, Some("test-key"), 30, 0, 0)
            .expect("client construction should not fail"),
    );
    let metrics = MetricsAggregator::new(
        Arc::clone(&source),
        Duration::from_secs(120),
        Duration::from_secs(300),
    );
    let validation = ValidationService::new(
        source,
        Duration::from_secs(300),
        Duration::from_secs(600),
    );
    ReportCollector::new(Arc::new(metrics), Arc::new(validation))
}

fn scores(value: f64) -> serde_json::Value {
    json!({
        "readability": value,
        "seo": value,
        "accessibility": value,
        "performance": value,
        "engagement": value
    })
}

fn section(
    id: &str,
    kind: SectionKind,
    data_source: &str,
    config: serde_json::Value,
    order: u32,
) -> ReportSection {
    ReportSection {
        id: id.to_owned(),
        title: id.to_uppercase(),
        kind,
        data_source: data_source.to_owned(),
        config,
        order,
    }
}

fn digest_template(registry: &TemplateRegistry) -> ReportTemplate {
    registry
        .create_template(&TemplateDefinition {
            name: "Weekly Digest".to_owned(),
            kind: "summary".to_owned(),
            sections: vec![
                section("trend", SectionKind::Chart, "analytics", serde_json::Value::Null, 1),
                section(
                    "links",
                    SectionKind::Table,
                    "links",
                    json!({"urls": ["https://a.test/", "https://b.test/"]}),
                    2,
                ),
                section("notes", SectionKind::Text, "custom", serde_json::Value::Null, 3),
            ],
            output_format: ReportFormat::Json,
        })
        .expect("template should validate")
}

async fn mount_aggregate(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/metrics/aggregate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buckets": [
                {"bucket_start": "2026-08-15T00:00:00Z", "metrics": scores(78.0), "sample_count": 40}
            ],
            "overall": scores(80.0),
            "previous_overall": scores(64.0),
            "sample_count": 40
        })))
        .mount(server)
        .await;
}

async fn mount_links(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/validation/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"url": "https://a.test/", "status": "valid", "status_code": 200},
                {"url": "https://b.test/", "status": "invalid", "status_code": 404}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn generated_report_covers_every_section() {
    let server = MockServer::start().await;
    mount_aggregate(&server).await;
    mount_links(&server).await;

    let registry = TemplateRegistry::default();
    let template = digest_template(&registry);
    let collector = collector(&server.uri());
    let options = GenerateOptions {
        custom_data: [("notes".to_owned(), json!({"text": "ship it"}))]
            .into_iter()
            .collect(),
        ..GenerateOptions::default()
    };

    let rendered = generate(&collector, &template, &options)
        .await
        .expect("generation should succeed");

    let report = &rendered.report;
    assert_eq!(report.template_id, template.id);
    assert_eq!(report.format, ReportFormat::Json);
    assert_eq!(report.section_count, 3);
    assert_eq!(report.chart_count, 1);
    assert_eq!(report.table_count, 1);
    assert_eq!(report.size_bytes, rendered.payload.len());
    assert!(report.download_ref.contains(&report.id.to_string()));
    assert_eq!(report.period.end - report.period.start, chrono::Duration::days(30));

    let document: serde_json::Value = serde_json::from_slice(&rendered.payload).unwrap();
    let sections = document["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 3);

    assert_eq!(sections[0]["id"], "trend");
    assert_eq!(sections[0]["payload"]["overall"]["readability"], 80.0);
    assert_eq!(sections[0]["payload"]["trend"]["change"], 25.0);
    assert_eq!(sections[0]["payload"]["trend"]["direction"], "up");

    assert_eq!(sections[1]["id"], "links");
    assert_eq!(sections[1]["payload"]["summary"]["invalid"], 1);

    assert_eq!(sections[2]["id"], "notes");
    assert_eq!(sections[2]["payload"]["text"], "ship it");
}

#[tokio::test]
async fn failing_data_source_is_isolated_to_its_section() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/metrics/aggregate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_links(&server).await;

    let registry = TemplateRegistry::default();
    let template = digest_template(&registry);
    let collector = collector(&server.uri());

    let rendered = generate(&collector, &template, &GenerateOptions::default())
        .await
        .expect("generation should survive a failing section");

    assert_eq!(rendered.report.section_count, 3);
    let document: serde_json::Value = serde_json::from_slice(&rendered.payload).unwrap();
    let sections = document["sections"].as_array().unwrap();
    assert!(sections[0]["payload"]["error"].is_string());
    assert_eq!(sections[1]["payload"]["summary"]["invalid"], 1);
}

#[tokio::test]
async fn custom_section_without_data_gets_a_placeholder() {
    let server = MockServer::start().await;
    mount_aggregate(&server).await;
    mount_links(&server).await;

    let registry = TemplateRegistry::default();
    let template = digest_template(&registry);
    let collector = collector(&server.uri());

    let rendered = generate(&collector, &template, &GenerateOptions::default())
        .await
        .expect("generation should succeed");

    let document: serde_json::Value = serde_json::from_slice(&rendered.payload).unwrap();
    let notes = &document["sections"].as_array().unwrap()[2];
    assert_eq!(notes["payload"]["placeholder"], true);
    assert_eq!(notes["payload"]["data_source"], "custom");
}

#[tokio::test]
async fn links_section_without_urls_becomes_an_error_marker() {
    let server = MockServer::start().await;

    let registry = TemplateRegistry::default();
    let template = registry
        .create_template(&TemplateDefinition {
            name: "Broken Links Report".to_owned(),
            kind: "links".to_owned(),
            sections: vec![section(
                "status",
                SectionKind::Table,
                "links",
                serde_json::Value::Null,
                1,
            )],
            output_format: ReportFormat::Json,
        })
        .expect("template should validate");
    let collector = collector(&server.uri());

    let rendered = generate(&collector, &template, &GenerateOptions::default())
        .await
        .expect("generation should succeed");

    let document: serde_json::Value = serde_json::from_slice(&rendered.payload).unwrap();
    let status = &document["sections"].as_array().unwrap()[0];
    let message = status["payload"]["error"].as_str().unwrap();
    assert!(message.contains("urls"));
}

#[tokio::test]
async fn content_section_projects_the_overall_rollup() {
    let server = MockServer::start().await;
    mount_aggregate(&server).await;

    let registry = TemplateRegistry::default();
    let template = registry
        .create_template(&TemplateDefinition {
            name: "Scores Only".to_owned(),
            kind: "quality".to_owned(),
            sections: vec![section(
                "scores",
                SectionKind::Metrics,
                "content",
                serde_json::Value::Null,
                1,
            )],
            output_format: ReportFormat::Json,
        })
        .expect("template should validate");
    let collector = collector(&server.uri());

    let rendered = generate(&collector, &template, &GenerateOptions::default())
        .await
        .expect("generation should succeed");

    let document: serde_json::Value = serde_json::from_slice(&rendered.payload).unwrap();
    let payload = &document["sections"].as_array().unwrap()[0]["payload"];
    assert_eq!(payload["overall"]["seo"], 80.0);
    assert_eq!(payload["sample_count"], 40);
    assert_eq!(payload["trend"]["direction"], "up");
    assert!(payload.get("buckets").is_none());
}

#[tokio::test]
async fn explicit_period_flows_to_the_aggregate_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/metrics/aggregate"))
        .and(body_partial_json(json!({
            "start_date": "2026-07-01T00:00:00Z",
            "end_date": "2026-08-01T00:00:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "buckets": [],
            "overall": scores(70.0),
            "sample_count": 9
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = TemplateRegistry::default();
    let template = registry
        .create_template(&TemplateDefinition {
            name: "July Review".to_owned(),
            kind: "summary".to_owned(),
            sections: vec![section(
                "trend",
                SectionKind::Chart,
                "analytics",
                serde_json::Value::Null,
                1,
            )],
            output_format: ReportFormat::Json,
        })
        .expect("template should validate");
    let collector = collector(&server.uri());
    let period = ReportPeriod {
        start: "2026-07-01T00:00:00Z".parse().unwrap(),
        end: "2026-08-01T00:00:00Z".parse().unwrap(),
    };
    let options = GenerateOptions {
        period: Some(period),
        ..GenerateOptions::default()
    };

    let rendered = generate(&collector, &template, &options)
        .await
        .expect("generation should succeed");
    assert_eq!(rendered.report.period, period);
}

#[tokio::test]
async fn format_override_wins_over_the_template_format() {
    let server = MockServer::start().await;
    mount_aggregate(&server).await;
    mount_links(&server).await;

    let registry = TemplateRegistry::default();
    let template = digest_template(&registry);
    let collector = collector(&server.uri());
    let options = GenerateOptions {
        format: Some(ReportFormat::Csv),
        ..GenerateOptions::default()
    };

    let rendered = generate(&collector, &template, &options)
        .await
        .expect("generation should succeed");

    assert_eq!(rendered.report.format, ReportFormat::Csv);
    let text = String::from_utf8(rendered.payload).unwrap();
    assert!(text.starts_with("section_id,title,kind,payload"));
}

#[tokio::test]
async fn stored_reports_round_trip_download_and_export() {
    let server = MockServer::start().await;
    mount_aggregate(&server).await;
    mount_links(&server).await;

    let registry = TemplateRegistry::default();
    let template = digest_template(&registry);
    let collector = collector(&server.uri());
    let store = ReportStore::new(8);

    let rendered = generate(&collector, &template, &GenerateOptions::default())
        .await
        .expect("generation should succeed");
    let expected_payload = rendered.payload.clone();
    let envelope = store.insert(rendered).expect("insert should succeed");

    assert_eq!(store.list().len(), 1);

    let (report, payload) = store.download(envelope.id).expect("download should succeed");
    assert_eq!(report.id, envelope.id);
    assert_eq!(payload, expected_payload);

    let export = store
        .export(envelope.id, ExportFormat::Csv)
        .expect("export should succeed");
    assert_eq!(export.mime_type, "text/csv");
    assert_eq!(export.filename, format!("report-{}.csv", envelope.id));
    assert!(export.data.starts_with("section_id,title,kind,payload"));

    let missing = store.export(Uuid::new_v4(), ExportFormat::Json);
    assert!(matches!(missing, Err(ReportError::ReportNotFound(_))));
}
