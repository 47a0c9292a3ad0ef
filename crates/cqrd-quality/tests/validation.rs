//! Integration tests for content validation and link checking against a
//! mock source.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_cron_scheduler::JobScheduler;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cqrd_core::ContentType;
use cqrd_quality::types::{
    CheckCadence, IssueSeverity, LinkCheckOptions, LinkStatus, LinkSummary,
};
use cqrd_quality::{schedule_link_check, ValidationService};
use cqrd_source::SourceClient;

fn test_service(base_url: &str) -> ValidationService {
    let source = SourceClient::with_base_url(base_url, Some("test-key"), 30, 0, 0)
        .expect("client construction should not fail");
    ValidationService::new(
        Arc::new(source),
        Duration::from_secs(300),
        Duration::from_secs(600),
    )
}

fn markdown_report_body() -> serde_json::Value {
    json!({
        "is_valid": false,
        "score": 58.0,
        "issues": [
            {
                "rule": "image-alt-text",
                "severity": "error",
                "message": "image on line 12 is missing alt text",
                "line": 12
            },
            {
                "rule": "readability-score",
                "severity": "warning",
                "message": "average sentence length is high"
            }
        ],
        "suggestions": ["add alt text to all images"],
        "subscores": {
            "readability": 61.0,
            "seo": 70.0,
            "accessibility": 40.0,
            "quality": 62.0
        }
    })
}

fn clean_report_body() -> serde_json::Value {
    json!({
        "is_valid": true,
        "score": 92.0,
        "issues": [],
        "suggestions": [],
        "subscores": {
            "readability": 90.0,
            "seo": 94.0,
            "accessibility": 91.0,
            "quality": 93.0
        }
    })
}

#[tokio::test]
async fn markdown_missing_alt_text_fails_validation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"content_type": "markdown"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(markdown_report_body()))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let result = service
        .validate_content(
            "# Title\n\n![](broken.png)\n",
            ContentType::Markdown,
            None,
            None,
            true,
        )
        .await;

    assert!(!result.is_valid);
    assert_eq!(result.score, 58.0);
    assert_eq!(result.issues.len(), 2);
    assert_eq!(result.issues[0].rule, "image-alt-text");
    assert_eq!(result.issues[0].severity, IssueSeverity::Error);
    assert_eq!(result.issues[0].line, Some(12));
    assert_eq!(result.subscores.accessibility, 40.0);
}

#[tokio::test]
async fn default_markdown_rules_are_sent_when_rules_omitted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .and(body_partial_json(json!({
            "rules": [
                "heading-structure",
                "link-validation",
                "image-alt-text",
                "code-block-language",
                "table-structure",
                "readability-score"
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(clean_report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let result = service
        .validate_content("# Title\n", ContentType::Markdown, None, None, true)
        .await;

    assert!(result.is_valid);
}

#[tokio::test]
async fn explicit_rules_override_the_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .and(body_partial_json(json!({"rules": ["spelling-check"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(clean_report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let rules = vec!["spelling-check".to_owned()];
    let result = service
        .validate_content("hello world", ContentType::Text, Some(&rules), None, true)
        .await;

    assert!(result.is_valid);
}

#[tokio::test]
async fn caller_metadata_is_forwarded_to_the_validator() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .and(body_partial_json(json!({
            "metadata": {"author": "jo", "locale": "en-US"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(clean_report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let metadata = json!({"author": "jo", "locale": "en-US"});
    let result = service
        .validate_content("# Title\n", ContentType::Markdown, None, Some(&metadata), true)
        .await;

    assert!(result.is_valid);
}

#[tokio::test]
async fn repeated_validation_issues_exactly_one_remote_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(markdown_report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let content = "# Title\n\n![](broken.png)\n";
    let first = service
        .validate_content(content, ContentType::Markdown, None, None, true)
        .await;
    let second = service
        .validate_content(content, ContentType::Markdown, None, None, true)
        .await;

    assert_eq!(first.score, second.score);
    assert_eq!(first.issues.len(), second.issues.len());
}

#[tokio::test]
async fn remote_failure_returns_optimistic_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let result = service
        .validate_content("# Title\n", ContentType::Markdown, None, None, true)
        .await;

    assert!(result.is_valid);
    assert_eq!(result.score, 85.0);
    assert!(result.issues.is_empty());
    assert_eq!(result.subscores.quality, 85.0);
}

#[tokio::test]
async fn fallback_results_are_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(markdown_report_body()))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let content = "# Title\n\n![](broken.png)\n";

    let first = service
        .validate_content(content, ContentType::Markdown, None, None, true)
        .await;
    assert!(first.is_valid, "first call degrades to the fallback");

    let second = service
        .validate_content(content, ContentType::Markdown, None, None, true)
        .await;
    assert!(!second.is_valid, "second call reaches the recovered source");
    assert_eq!(second.score, 58.0);
}

#[tokio::test]
async fn wire_scores_are_clamped_into_range() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_valid": true,
            "score": 130.0,
            "issues": [],
            "suggestions": [],
            "subscores": {
                "readability": -5.0,
                "seo": 101.0,
                "accessibility": 55.0,
                "quality": 88.0
            }
        })))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let result = service
        .validate_content("# Title\n", ContentType::Markdown, None, None, true)
        .await;

    assert_eq!(result.score, 100.0);
    assert_eq!(result.subscores.readability, 0.0);
    assert_eq!(result.subscores.seo, 100.0);
    assert_eq!(result.subscores.accessibility, 55.0);
}

#[tokio::test]
async fn link_check_reports_mixed_statuses() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/links"))
        .and(body_partial_json(json!({
            "timeout_ms": 10000,
            "follow_redirects": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"url": "https://a.test/", "status": "valid", "status_code": 200, "response_time_ms": 31},
                {"url": "https://b.test/", "status": "valid", "status_code": 200, "response_time_ms": 54},
                {"url": "https://c.test/missing", "status": "invalid", "status_code": 404},
                {"url": "https://d.test/slow", "status": "warning", "status_code": 200, "response_time_ms": 4800}
            ]
        })))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let urls = vec![
        "https://a.test/".to_owned(),
        "https://b.test/".to_owned(),
        "https://c.test/missing".to_owned(),
        "https://d.test/slow".to_owned(),
    ];
    let result = service
        .validate_links(&urls, &LinkCheckOptions::default())
        .await;

    assert_eq!(
        result.summary,
        LinkSummary {
            total: 4,
            valid: 2,
            invalid: 1,
            warnings: 1
        }
    );
    assert_eq!(result.results[2].status, LinkStatus::Invalid);
    assert_eq!(result.results[2].status_code, Some(404));
}

#[tokio::test]
async fn link_cache_key_ignores_url_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/links"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"url": "https://a.test/", "status": "valid", "status_code": 200},
                {"url": "https://b.test/", "status": "invalid", "status_code": 404}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let forward = vec!["https://a.test/".to_owned(), "https://b.test/".to_owned()];
    let reversed = vec!["https://b.test/".to_owned(), "https://a.test/".to_owned()];

    let first = service
        .validate_links(&forward, &LinkCheckOptions::default())
        .await;
    let second = service
        .validate_links(&reversed, &LinkCheckOptions::default())
        .await;

    assert_eq!(first.summary, second.summary);
}

#[tokio::test]
async fn link_check_failure_marks_every_url_pending() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/validation/links"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = test_service(&server.uri());
    let urls = vec!["https://a.test/".to_owned(), "https://b.test/".to_owned()];
    let result = service
        .validate_links(&urls, &LinkCheckOptions::default())
        .await;

    assert_eq!(result.results.len(), 2);
    assert!(result
        .results
        .iter()
        .all(|r| r.status == LinkStatus::Pending));
    assert_eq!(result.results[0].url, "https://a.test/");
    assert_eq!(
        result.summary,
        LinkSummary {
            total: 2,
            valid: 0,
            invalid: 0,
            warnings: 2
        }
    );
}

#[tokio::test]
async fn schedule_link_check_registers_a_job() {
    let server = MockServer::start().await;
    let service = Arc::new(test_service(&server.uri()));
    let scheduler = JobScheduler::new().await.expect("scheduler should start");

    let job_id = schedule_link_check(
        &scheduler,
        service,
        vec!["https://a.test/".to_owned()],
        CheckCadence::Daily,
    )
    .await
    .expect("job registration should succeed");

    assert!(!job_id.is_nil());
}
