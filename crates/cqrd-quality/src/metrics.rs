//! Metrics retrieval and aggregation with per-filter caching.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use cqrd_cache::{PruneExpired, TtlCache};
use cqrd_core::MetricsPeriod;
use cqrd_source::types::AggregateRequest;
use cqrd_source::SourceClient;
use futures::future::join_all;

use crate::error::QualityError;
use crate::keys::{AggregateKey, MetricsKey};
use crate::types::{
    AggregatedMetrics, MetricSet, MetricsBucket, MetricsFilter, QualityMetrics, Trend,
};

/// Percentage change from `previous` to `current`.
///
/// A zero or non-finite baseline carries no signal and yields `None` rather
/// than an infinite or meaningless percentage.
fn percent_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

/// Fetches and aggregates quality metrics from the remote source.
///
/// Unlike validation, metrics calls propagate errors: a caller asking for
/// numbers needs to know when there are none.
pub struct MetricsAggregator {
    source: Arc<SourceClient>,
    metrics_cache: Arc<TtlCache<MetricsKey, Vec<QualityMetrics>>>,
    aggregate_cache: Arc<TtlCache<AggregateKey, AggregatedMetrics>>,
    metrics_ttl: Duration,
    aggregate_ttl: Duration,
}

impl MetricsAggregator {
    /// Creates the aggregator with fresh caches and the given TTLs.
    #[must_use]
    pub fn new(source: Arc<SourceClient>, metrics_ttl: Duration, aggregate_ttl: Duration) -> Self {
        Self {
            source,
            metrics_cache: Arc::new(TtlCache::new()),
            aggregate_cache: Arc::new(TtlCache::new()),
            metrics_ttl,
            aggregate_ttl,
        }
    }

    /// Handles for the process-wide cache sweeper.
    #[must_use]
    pub fn caches(&self) -> Vec<Arc<dyn PruneExpired>> {
        vec![
            Arc::clone(&self.metrics_cache) as Arc<dyn PruneExpired>,
            Arc::clone(&self.aggregate_cache) as Arc<dyn PruneExpired>,
        ]
    }

    /// Time series of quality metrics for one piece of content, newest first.
    pub async fn get_quality_metrics(
        &self,
        content_id: &str,
        period: MetricsPeriod,
        use_cache: bool,
    ) -> Result<Vec<QualityMetrics>, QualityError> {
        let key = MetricsKey::new(content_id, period);
        if use_cache {
            if let Some(hit) = self.metrics_cache.get(&key) {
                tracing::debug!(content_id, %period, "metrics served from cache");
                return Ok(hit);
            }
        }

        let snapshots = self.source.get_quality_metrics(content_id, period).await?;
        let mut metrics: Vec<QualityMetrics> = snapshots
            .into_iter()
            .map(|snapshot| QualityMetrics::from_wire(snapshot, period))
            .collect();
        // The source does not guarantee ordering.
        metrics.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if use_cache {
            self.metrics_cache
                .set(key, metrics.clone(), self.metrics_ttl);
        }
        Ok(metrics)
    }

    /// Aggregated metrics for a filter, with the trend against the previous
    /// window of the same length.
    ///
    /// The cache key canonicalizes the filter as submitted, not the resolved
    /// date range, so repeated queries for "last week" share an entry for the
    /// cache TTL even as the wall clock advances.
    pub async fn get_aggregated(
        &self,
        filter: &MetricsFilter,
    ) -> Result<AggregatedMetrics, QualityError> {
        let key = AggregateKey::new(filter);
        if let Some(hit) = self.aggregate_cache.get(&key) {
            tracing::debug!(period = filter.period.as_str(), "aggregate served from cache");
            return Ok(hit);
        }

        let (start, end) = filter.resolve_range(Utc::now())?;

        let content_types = filter.content_types.clone().map(|mut types| {
            types.sort_by_key(|t| t.as_str());
            types.dedup();
            types
        });

        let request = AggregateRequest {
            start_date: start,
            end_date: end,
            content_types,
            aggregation: filter.aggregation,
        };
        let report = self.source.aggregate_metrics(&request).await?;

        let overall = MetricSet::from(report.overall);
        let change = report
            .previous_overall
            .map(MetricSet::from)
            .and_then(|previous| percent_change(overall.composite(), previous.composite()));

        let aggregated = AggregatedMetrics {
            period_start: start,
            period_end: end,
            overall,
            buckets: report.buckets.into_iter().map(MetricsBucket::from).collect(),
            sample_count: report.sample_count,
            trend: Trend::from_change(filter.period.as_str(), change),
        };

        self.aggregate_cache
            .set(key, aggregated.clone(), self.aggregate_ttl);
        Ok(aggregated)
    }

    /// Metric series for several content ids at once.
    ///
    /// Ids whose fetch fails are logged and omitted from the map; one bad id
    /// does not sink the batch. Results bypass the per-id cache so every
    /// series in the comparison is equally fresh.
    pub async fn get_quality_trends(
        &self,
        content_ids: &[String],
        period: MetricsPeriod,
    ) -> HashMap<String, Vec<QualityMetrics>> {
        let fetches = content_ids
            .iter()
            .map(|id| async move { (id.clone(), self.get_quality_metrics(id, period, false).await) });

        let mut trends = HashMap::new();
        for (content_id, outcome) in join_all(fetches).await {
            match outcome {
                Ok(metrics) => {
                    trends.insert(content_id, metrics);
                }
                Err(e) => {
                    tracing::warn!(
                        %content_id,
                        %period,
                        error = %e,
                        "trend fetch failed, omitting content id"
                    );
                }
            }
        }
        trends
    }

    /// Aggregate across all content for a standard period.
    pub async fn overall_summary(
        &self,
        period: MetricsPeriod,
    ) -> Result<AggregatedMetrics, QualityError> {
        self.get_aggregated(&MetricsFilter::for_period(period)).await
    }
}

#[cfg(test)]
mod tests {
    use super::percent_change;

    #[test]
    fn percent_change_against_nonzero_baseline() {
        assert_eq!(percent_change(80.0, 64.0), Some(25.0));
        assert_eq!(percent_change(48.0, 64.0), Some(-25.0));
    }

    #[test]
    fn zero_baseline_has_no_signal() {
        assert_eq!(percent_change(50.0, 0.0), None);
    }

    #[test]
    fn flat_series_reads_as_zero_change() {
        assert_eq!(percent_change(80.0, 80.0), Some(0.0));
    }
}
