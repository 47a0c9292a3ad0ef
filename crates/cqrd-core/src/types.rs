//! Shared vocabulary used across the pipeline crates.

use serde::{Deserialize, Serialize};

/// Kind of content blob submitted for validation.
///
/// `Unknown` absorbs any value the wire sends that we do not model; the
/// validation layer runs only a basic rule set against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Html,
    Text,
    #[serde(other)]
    Unknown,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Markdown => "markdown",
            ContentType::Html => "html",
            ContentType::Text => "text",
            ContentType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => ContentType::Markdown,
            "html" => ContentType::Html,
            "text" | "plain" => ContentType::Text,
            _ => ContentType::Unknown,
        })
    }
}

/// Trailing time window for per-item quality metrics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricsPeriod {
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl MetricsPeriod {
    /// Wire token understood by the remote data source.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetricsPeriod::Day => "24h",
            MetricsPeriod::Week => "7d",
            MetricsPeriod::Month => "30d",
        }
    }

    /// Length of the window.
    #[must_use]
    pub fn window(self) -> chrono::Duration {
        match self {
            MetricsPeriod::Day => chrono::Duration::hours(24),
            MetricsPeriod::Week => chrono::Duration::days(7),
            MetricsPeriod::Month => chrono::Duration::days(30),
        }
    }
}

impl std::fmt::Display for MetricsPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetricsPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(MetricsPeriod::Day),
            "7d" => Ok(MetricsPeriod::Week),
            "30d" => Ok(MetricsPeriod::Month),
            other => Err(format!(
                "unknown metrics period '{other}'; expected 24h, 7d, or 30d"
            )),
        }
    }
}

/// Bucket width for aggregated metrics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Day,
    Week,
    Month,
}

impl Aggregation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Day => "day",
            Aggregation::Week => "week",
            Aggregation::Month => "month",
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
