//! Wire types for the remote content-quality data source.
//!
//! All bodies are snake_case JSON. These types mirror the remote contract
//! exactly; clamping, summary recomputation, and other sanitization happen
//! downstream at the domain boundary, never here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cqrd_core::{Aggregation, ContentType};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body for `POST /v1/validation/content`.
#[derive(Debug, Clone, Serialize)]
pub struct ContentValidationRequest {
    pub content: String,
    pub content_type: ContentType,
    pub rules: Vec<String>,
    /// Opaque caller context, forwarded to the validator untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Body for `POST /v1/validation/links`.
#[derive(Debug, Clone, Serialize)]
pub struct LinkValidationRequest {
    pub urls: Vec<String>,
    pub timeout_ms: u64,
    pub follow_redirects: bool,
    pub check_content: bool,
}

/// Body for `POST /v1/metrics/aggregate`.
///
/// The endpoint only understands explicit date ranges; period tokens are
/// resolved to ranges before a request is built.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRequest {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_types: Option<Vec<ContentType>>,
    pub aggregation: Aggregation,
}

/// Body for `POST /v1/events`. Best-effort telemetry; senders ignore failures.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub name: String,
    pub occurred_at: DateTime<Utc>,
    pub properties: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Error envelope the source returns on any non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

/// Result of a remote content validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub score: f64,
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub subscores: Subscores,
}

/// One finding attached to a validation report.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationIssue {
    pub rule: String,
    pub severity: String,
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
}

/// Per-dimension scores attached to a validation report.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Subscores {
    pub readability: f64,
    pub seo: f64,
    pub accessibility: f64,
    pub quality: f64,
}

/// Envelope for `POST /v1/validation/links`: `{ "results": [...] }`.
#[derive(Debug, Deserialize)]
pub struct LinkResults {
    pub results: Vec<LinkCheckRow>,
}

/// Backend verdict for one checked URL.
///
/// `status` stays a plain string on the wire; unknown verdicts are mapped to
/// a pending status at the domain boundary rather than failing the whole
/// response.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkCheckRow {
    pub url: String,
    pub status: String,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

/// Envelope for `GET /v1/metrics/quality`: `{ "snapshots": [...] }`.
#[derive(Debug, Deserialize)]
pub struct MetricsSnapshots {
    pub snapshots: Vec<MetricsSnapshot>,
}

/// One stored quality measurement for a content item.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSnapshot {
    pub id: String,
    pub content_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricScores,
    #[serde(default)]
    pub trend: Option<TrendSample>,
}

/// The five measured quality dimensions.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MetricScores {
    pub readability: f64,
    pub seo: f64,
    pub accessibility: f64,
    pub performance: f64,
    pub engagement: f64,
}

/// Trend annotation the source may attach to a snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendSample {
    pub period: String,
    #[serde(default)]
    pub change: Option<f64>,
    #[serde(default)]
    pub direction: Option<String>,
}

/// Result of `POST /v1/metrics/aggregate`.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateReport {
    #[serde(default)]
    pub buckets: Vec<AggregateBucket>,
    pub overall: MetricScores,
    /// Same aggregation over the window immediately before the requested one;
    /// absent when the source has no history there.
    #[serde(default)]
    pub previous_overall: Option<MetricScores>,
    pub sample_count: u64,
}

/// One time bucket of an aggregate report.
#[derive(Debug, Clone, Deserialize)]
pub struct AggregateBucket {
    pub bucket_start: DateTime<Utc>,
    pub metrics: MetricScores,
    pub sample_count: u64,
}

/// Persisted schedule state, exchanged via `GET /v1/schedules` and
/// `PUT /v1/schedules/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: Uuid,
    pub template_id: String,
    pub frequency: String,
    pub time_of_day: String,
    pub timezone: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    pub enabled: bool,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,
}

/// Envelope for `GET /v1/schedules`: `{ "schedules": [...] }`.
#[derive(Debug, Deserialize)]
pub struct ScheduleRecords {
    pub schedules: Vec<ScheduleRecord>,
}
