//! Link checking and recurring link-check jobs.

use std::sync::Arc;

use chrono::Utc;
use cqrd_source::types::LinkValidationRequest;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::error::QualityError;
use crate::keys::LinkSetKey;
use crate::types::{
    CheckCadence, LinkCheckOptions, LinkCheckResult, LinkSummary, LinkValidationResult,
};
use crate::validate::ValidationService;

impl ValidationService {
    /// Checks a set of URLs.
    ///
    /// The cache key fingerprints the sorted, deduplicated URL set, so the
    /// same URLs in any order share one entry. When the remote check fails
    /// every URL comes back as `Pending` with a matching summary, and that
    /// result is not cached.
    pub async fn validate_links(
        &self,
        urls: &[String],
        options: &LinkCheckOptions,
    ) -> LinkValidationResult {
        let key = LinkSetKey::new(urls);
        if options.use_cache {
            if let Some(hit) = self.link_cache.get(&key) {
                tracing::debug!(count = urls.len(), "link check served from cache");
                return hit;
            }
        }

        let request = LinkValidationRequest {
            urls: urls.to_vec(),
            timeout_ms: options.timeout_ms,
            follow_redirects: options.follow_redirects,
            check_content: options.check_content,
        };

        match self.source.validate_links(&request).await {
            Ok(rows) => {
                let checked_at = Utc::now();
                let results: Vec<LinkCheckResult> = rows
                    .into_iter()
                    .map(|row| LinkCheckResult::from_wire(row, checked_at))
                    .collect();
                let summary = LinkSummary::from_rows(&results);
                let result = LinkValidationResult { results, summary };
                if options.use_cache {
                    self.link_cache.set(key, result.clone(), self.link_ttl);
                }
                result
            }
            Err(e) => {
                tracing::warn!(
                    count = urls.len(),
                    error = %e,
                    "link check failed, marking all urls pending"
                );
                let checked_at = Utc::now();
                let results: Vec<LinkCheckResult> = urls
                    .iter()
                    .map(|url| LinkCheckResult::pending(url.clone(), checked_at))
                    .collect();
                let summary = LinkSummary::from_rows(&results);
                LinkValidationResult { results, summary }
            }
        }
    }
}

/// Registers a recurring link check on `scheduler` and returns the job id.
///
/// Each firing runs a full (cached) link check over `urls` and logs the
/// summary. The job stays registered until the scheduler shuts down.
pub async fn schedule_link_check(
    scheduler: &JobScheduler,
    service: Arc<ValidationService>,
    urls: Vec<String>,
    cadence: CheckCadence,
) -> Result<Uuid, QualityError> {
    let count = urls.len();
    let urls = Arc::new(urls);
    let job = Job::new_async(cadence.cron_spec(), move |_uuid, _lock| {
        let service = Arc::clone(&service);
        let urls = Arc::clone(&urls);
        Box::pin(async move {
            let result = service
                .validate_links(&urls, &LinkCheckOptions::default())
                .await;
            tracing::info!(
                total = result.summary.total,
                valid = result.summary.valid,
                invalid = result.summary.invalid,
                warnings = result.summary.warnings,
                "scheduled link check completed"
            );
        })
    })?;
    let job_id = scheduler.add(job).await?;
    tracing::info!(%job_id, cadence = %cadence, count, "registered recurring link check");
    Ok(job_id)
}
