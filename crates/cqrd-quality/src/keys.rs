//! Composite cache keys.
//!
//! Every key used by the validation and metrics caches is derived here, in
//! exactly one place per key shape, so writer and reader can never disagree
//! on how a key is built.

use cqrd_cache::fingerprint::fingerprint;
use cqrd_core::{ContentType, MetricsPeriod};

use crate::types::MetricsFilter;

/// Cache key for one validated content blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    content_type: ContentType,
    fingerprint: String,
}

impl ContentKey {
    #[must_use]
    pub fn new(content_type: ContentType, content: &str) -> Self {
        Self {
            content_type,
            fingerprint: fingerprint(content),
        }
    }
}

/// Cache key for one checked URL set.
///
/// Derived from the sorted, de-duplicated URL list, so the same set in any
/// order maps to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkSetKey {
    fingerprint: String,
}

impl LinkSetKey {
    #[must_use]
    pub fn new(urls: &[String]) -> Self {
        let mut sorted: Vec<&str> = urls.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        Self {
            fingerprint: fingerprint(&sorted.join("\n")),
        }
    }
}

/// Cache key for a per-item metrics query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricsKey {
    content_id: String,
    period: MetricsPeriod,
}

impl MetricsKey {
    #[must_use]
    pub fn new(content_id: &str, period: MetricsPeriod) -> Self {
        Self {
            content_id: content_id.to_owned(),
            period,
        }
    }
}

/// Cache key for an aggregate query: the canonical JSON of the filter.
///
/// Content types are sorted and de-duplicated before serialization so
/// semantically equal filters canonicalize identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateKey {
    canonical: String,
}

impl AggregateKey {
    #[must_use]
    pub fn new(filter: &MetricsFilter) -> Self {
        let mut normalized = filter.clone();
        if let Some(types) = normalized.content_types.as_mut() {
            types.sort_by_key(|t| t.as_str());
            types.dedup();
        }
        // Struct field order is fixed, so this serialization is canonical.
        let canonical =
            serde_json::to_string(&normalized).unwrap_or_else(|_| format!("{normalized:?}"));
        Self { canonical }
    }
}
