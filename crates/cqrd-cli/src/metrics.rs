//! `metrics` command: per-content series or the corpus-wide summary.

use cqrd_core::MetricsPeriod;
use cqrd_quality::types::Trend;

use crate::Services;

/// Prints quality metrics for one content id, or the aggregated
/// summary across all content when no id is given.
///
/// # Errors
///
/// Returns an error when the remote source cannot be reached or
/// rejects the query.
pub(crate) async fn run_metrics(
    services: &Services,
    content_id: Option<&str>,
    period: MetricsPeriod,
) -> anyhow::Result<()> {
    match content_id {
        Some(id) => run_series(services, id, period).await,
        None => run_summary(services, period).await,
    }
}

async fn run_series(services: &Services, content_id: &str, period: MetricsPeriod) -> anyhow::Result<()> {
    let series = services
        .metrics
        .get_quality_metrics(content_id, period, true)
        .await?;

    if series.is_empty() {
        println!("no metrics recorded for '{content_id}' in the last {period}");
        return Ok(());
    }

    println!("Content: {content_id} (last {period})");
    println!();
    println!(
        "{:<18}{:>7}{:>7}{:>7}{:>7}{:>7}  TREND",
        "RECORDED", "READ", "SEO", "A11Y", "PERF", "ENG",
    );
    for point in &series {
        println!(
            "{:<18}{:>7.1}{:>7.1}{:>7.1}{:>7.1}{:>7.1}  {}",
            point.timestamp.format("%Y-%m-%d %H:%M"),
            point.metrics.readability,
            point.metrics.seo,
            point.metrics.accessibility,
            point.metrics.performance,
            point.metrics.engagement,
            fmt_trend(&point.trend),
        );
    }
    Ok(())
}

async fn run_summary(services: &Services, period: MetricsPeriod) -> anyhow::Result<()> {
    let aggregated = services.metrics.overall_summary(period).await?;

    println!(
        "Overall quality, last {period}: {} to {}",
        aggregated.period_start.format("%Y-%m-%d"),
        aggregated.period_end.format("%Y-%m-%d"),
    );
    println!("Samples: {}", aggregated.sample_count);
    println!(
        "Scores: readability {:.1}, seo {:.1}, accessibility {:.1}, performance {:.1}, engagement {:.1}",
        aggregated.overall.readability,
        aggregated.overall.seo,
        aggregated.overall.accessibility,
        aggregated.overall.performance,
        aggregated.overall.engagement,
    );
    println!("Trend: {}", fmt_trend(&aggregated.trend));

    if aggregated.buckets.is_empty() {
        return Ok(());
    }

    println!();
    println!(
        "{:<18}{:>7}{:>7}{:>7}{:>7}{:>7}{:>9}",
        "BUCKET", "READ", "SEO", "A11Y", "PERF", "ENG", "SAMPLES",
    );
    for bucket in &aggregated.buckets {
        println!(
            "{:<18}{:>7.1}{:>7.1}{:>7.1}{:>7.1}{:>7.1}{:>9}",
            bucket.bucket_start.format("%Y-%m-%d %H:%M"),
            bucket.metrics.readability,
            bucket.metrics.seo,
            bucket.metrics.accessibility,
            bucket.metrics.performance,
            bucket.metrics.engagement,
            bucket.sample_count,
        );
    }
    Ok(())
}

fn fmt_trend(trend: &Trend) -> String {
    match trend.change {
        Some(change) => format!("{} ({change:+.1}%)", trend.direction.as_str()),
        None => trend.direction.as_str().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use cqrd_quality::types::Trend;

    use super::fmt_trend;

    #[test]
    fn trend_shows_the_signed_change_when_present() {
        assert_eq!(fmt_trend(&Trend::from_change("7d", Some(4.25))), "up (+4.2%)");
        assert_eq!(fmt_trend(&Trend::from_change("7d", Some(-3.0))), "down (-3.0%)");
        assert_eq!(fmt_trend(&Trend::from_change("7d", None)), "stable");
    }
}
