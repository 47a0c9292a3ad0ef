//! Domain types for validation results and quality metrics.
//!
//! Wire payloads from the remote source are sanitized into these types at
//! exactly one boundary: scores are clamped to [0, 100], link summaries are
//! recomputed from the rows, and trend directions are derived from the
//! change value rather than trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cqrd_core::{Aggregation, ContentType, MetricsPeriod};
use cqrd_source::types as wire;

use crate::error::QualityError;

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Severity of one validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

impl IssueSeverity {
    /// Unknown wire severities read as informational.
    fn from_wire(value: &str) -> Self {
        match value {
            "error" => IssueSeverity::Error,
            "warning" => IssueSeverity::Warning,
            _ => IssueSeverity::Info,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
            IssueSeverity::Info => "info",
        }
    }
}

/// One finding from a content validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub rule: String,
    pub severity: IssueSeverity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl From<wire::ValidationIssue> for ValidationIssue {
    fn from(issue: wire::ValidationIssue) -> Self {
        Self {
            severity: IssueSeverity::from_wire(&issue.severity),
            rule: issue.rule,
            message: issue.message,
            line: issue.line,
        }
    }
}

/// Per-dimension scores for a validated content blob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub readability: f64,
    pub seo: f64,
    pub accessibility: f64,
    pub quality: f64,
}

impl From<wire::Subscores> for SubScores {
    fn from(s: wire::Subscores) -> Self {
        Self {
            readability: clamp_score(s.readability),
            seo: clamp_score(s.seo),
            accessibility: clamp_score(s.accessibility),
            quality: clamp_score(s.quality),
        }
    }
}

/// Outcome of validating one content blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub score: f64,
    pub issues: Vec<ValidationIssue>,
    pub suggestions: Vec<String>,
    pub subscores: SubScores,
}

impl ValidationResult {
    /// Optimistic placeholder returned when the remote validator is
    /// unreachable. Advisory scores prefer availability over strictness.
    #[must_use]
    pub fn fallback() -> Self {
        const FALLBACK_SCORE: f64 = 85.0;
        Self {
            is_valid: true,
            score: FALLBACK_SCORE,
            issues: Vec::new(),
            suggestions: Vec::new(),
            subscores: SubScores {
                readability: FALLBACK_SCORE,
                seo: FALLBACK_SCORE,
                accessibility: FALLBACK_SCORE,
                quality: FALLBACK_SCORE,
            },
        }
    }
}

impl From<wire::ValidationReport> for ValidationResult {
    fn from(report: wire::ValidationReport) -> Self {
        Self {
            is_valid: report.is_valid,
            score: clamp_score(report.score),
            issues: report.issues.into_iter().map(Into::into).collect(),
            suggestions: report.suggestions,
            subscores: report.subscores.into(),
        }
    }
}

/// Verdict for one checked URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Invalid,
    Warning,
    Pending,
}

impl LinkStatus {
    /// Unknown wire verdicts map to `Pending` rather than failing the row.
    fn from_wire(value: &str) -> Self {
        match value {
            "valid" => LinkStatus::Valid,
            "invalid" => LinkStatus::Invalid,
            "warning" => LinkStatus::Warning,
            _ => LinkStatus::Pending,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LinkStatus::Valid => "valid",
            LinkStatus::Invalid => "invalid",
            LinkStatus::Warning => "warning",
            LinkStatus::Pending => "pending",
        }
    }
}

/// Check outcome for one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCheckResult {
    pub url: String,
    pub status: LinkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    pub last_checked: DateTime<Utc>,
}

impl LinkCheckResult {
    /// Converts one wire row, defaulting `last_checked` to `checked_at`
    /// when the source omits it.
    pub(crate) fn from_wire(row: wire::LinkCheckRow, checked_at: DateTime<Utc>) -> Self {
        Self {
            status: LinkStatus::from_wire(&row.status),
            url: row.url,
            status_code: row.status_code,
            response_time_ms: row.response_time_ms,
            last_checked: row.last_checked.unwrap_or(checked_at),
        }
    }

    /// Placeholder row used when the remote checker is unreachable.
    pub(crate) fn pending(url: String, checked_at: DateTime<Utc>) -> Self {
        Self {
            url,
            status: LinkStatus::Pending,
            status_code: None,
            response_time_ms: None,
            last_checked: checked_at,
        }
    }
}

/// Count summary over a set of link check rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub warnings: usize,
}

impl LinkSummary {
    /// Recomputes the summary from the rows. `warnings` counts both warning
    /// and pending rows so the three buckets always sum to `total`.
    #[must_use]
    pub fn from_rows(rows: &[LinkCheckResult]) -> Self {
        let valid = rows
            .iter()
            .filter(|r| r.status == LinkStatus::Valid)
            .count();
        let invalid = rows
            .iter()
            .filter(|r| r.status == LinkStatus::Invalid)
            .count();
        Self {
            total: rows.len(),
            valid,
            invalid,
            warnings: rows.len() - valid - invalid,
        }
    }
}

/// Outcome of checking one URL set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkValidationResult {
    pub results: Vec<LinkCheckResult>,
    pub summary: LinkSummary,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

/// Options for a link validation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkCheckOptions {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
    #[serde(default)]
    pub check_content: bool,
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl Default for LinkCheckOptions {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            follow_redirects: true,
            check_content: false,
            use_cache: true,
        }
    }
}

/// Recurrence for scheduled link checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckCadence {
    Hourly,
    Daily,
    Weekly,
}

impl CheckCadence {
    /// Six-field cron spec understood by the job scheduler. Daily and weekly
    /// runs land in the early-morning low-traffic window.
    #[must_use]
    pub fn cron_spec(self) -> &'static str {
        match self {
            CheckCadence::Hourly => "0 0 * * * *",
            CheckCadence::Daily => "0 0 2 * * *",
            CheckCadence::Weekly => "0 0 3 * * SUN",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CheckCadence::Hourly => "hourly",
            CheckCadence::Daily => "daily",
            CheckCadence::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for CheckCadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckCadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(CheckCadence::Hourly),
            "daily" => Ok(CheckCadence::Daily),
            "weekly" => Ok(CheckCadence::Weekly),
            other => Err(format!(
                "unknown cadence '{other}'; expected hourly, daily, or weekly"
            )),
        }
    }
}

/// The five measured quality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub readability: f64,
    pub seo: f64,
    pub accessibility: f64,
    pub performance: f64,
    pub engagement: f64,
}

impl MetricSet {
    /// Unweighted mean of the five dimensions, used for trend computation.
    #[must_use]
    pub fn composite(&self) -> f64 {
        (self.readability + self.seo + self.accessibility + self.performance + self.engagement)
            / 5.0
    }
}

impl From<wire::MetricScores> for MetricSet {
    fn from(m: wire::MetricScores) -> Self {
        Self {
            readability: clamp_score(m.readability),
            seo: clamp_score(m.seo),
            accessibility: clamp_score(m.accessibility),
            performance: clamp_score(m.performance),
            engagement: clamp_score(m.engagement),
        }
    }
}

/// Direction of a quality trend, derived from the change value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    #[default]
    Stable,
}

impl TrendDirection {
    /// Sub-half-percent movement reads as stable; a missing change value
    /// ("no signal") does too.
    #[must_use]
    pub fn from_change(change: Option<f64>) -> Self {
        match change {
            Some(c) if c >= 0.5 => TrendDirection::Up,
            Some(c) if c <= -0.5 => TrendDirection::Down,
            _ => TrendDirection::Stable,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        }
    }
}

/// Trend annotation on a metrics result.
///
/// `change` is a percentage; `None` means "no signal": there was no prior
/// window, or the prior value was zero. Direction always agrees with
/// `change`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trend {
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    pub direction: TrendDirection,
}

impl Trend {
    /// Single construction site, so direction can never disagree with
    /// change.
    #[must_use]
    pub fn from_change(period: &str, change: Option<f64>) -> Self {
        let change = change.filter(|c| c.is_finite());
        Self {
            period: period.to_owned(),
            change,
            direction: TrendDirection::from_change(change),
        }
    }
}

/// One quality snapshot for a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub id: String,
    pub content_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricSet,
    pub trend: Trend,
}

impl QualityMetrics {
    pub(crate) fn from_wire(snapshot: wire::MetricsSnapshot, period: MetricsPeriod) -> Self {
        let change = snapshot.trend.as_ref().and_then(|t| t.change);
        Self {
            id: snapshot.id,
            content_id: snapshot.content_id,
            timestamp: snapshot.timestamp,
            metrics: snapshot.metrics.into(),
            trend: Trend::from_change(period.as_str(), change),
        }
    }
}

/// Time window selector for aggregate queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "custom")]
    Custom,
}

impl Period {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "24h",
            Period::Week => "7d",
            Period::Month => "30d",
            Period::Custom => "custom",
        }
    }
}

impl From<MetricsPeriod> for Period {
    fn from(period: MetricsPeriod) -> Self {
        match period {
            MetricsPeriod::Day => Period::Day,
            MetricsPeriod::Week => Period::Week,
            MetricsPeriod::Month => Period::Month,
        }
    }
}

/// Filter for aggregate metrics queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsFilter {
    #[serde(default)]
    pub period: Period,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_types: Option<Vec<ContentType>>,
    #[serde(default)]
    pub aggregation: Aggregation,
}

impl MetricsFilter {
    /// Convenience filter covering one standard trailing window with daily
    /// buckets.
    #[must_use]
    pub fn for_period(period: MetricsPeriod) -> Self {
        Self {
            period: period.into(),
            start_date: None,
            end_date: None,
            content_types: None,
            aggregation: Aggregation::Day,
        }
    }

    /// Resolves the filter to the explicit date range the remote source
    /// understands. Custom periods require both dates; standard periods are
    /// trailing windows ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`QualityError::InvalidFilter`] when a custom period is
    /// missing a date or the range is inverted.
    pub fn resolve_range(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), QualityError> {
        match self.period {
            Period::Custom => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) if start <= end => Ok((start, end)),
                (Some(_), Some(_)) => Err(QualityError::InvalidFilter(
                    "start_date must not be after end_date".to_owned(),
                )),
                _ => Err(QualityError::InvalidFilter(
                    "custom period requires start_date and end_date".to_owned(),
                )),
            },
            Period::Day => Ok((now - chrono::Duration::hours(24), now)),
            Period::Week => Ok((now - chrono::Duration::days(7), now)),
            Period::Month => Ok((now - chrono::Duration::days(30), now)),
        }
    }
}

/// Aggregated quality metrics over a window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetrics {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub overall: MetricSet,
    pub buckets: Vec<MetricsBucket>,
    pub sample_count: u64,
    pub trend: Trend,
}

/// One time bucket of an aggregated result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsBucket {
    pub bucket_start: DateTime<Utc>,
    pub metrics: MetricSet,
    pub sample_count: u64,
}

impl From<wire::AggregateBucket> for MetricsBucket {
    fn from(b: wire::AggregateBucket) -> Self {
        Self {
            bucket_start: b.bucket_start,
            metrics: b.metrics.into(),
            sample_count: b.sample_count,
        }
    }
}
