use thiserror::Error;

use cqrd_source::SourceError;

/// Errors surfaced by the validation and metrics services.
///
/// Operations under the degrade-to-fallback policy never return these; the
/// enum covers the propagating tier only (metrics queries, filter
/// validation, job scheduling).
#[derive(Debug, Error)]
pub enum QualityError {
    /// The remote data source call failed after retries.
    #[error("data source error: {0}")]
    Source(#[from] SourceError),

    /// The metrics filter cannot be resolved to a date range.
    #[error("invalid metrics filter: {0}")]
    InvalidFilter(String),

    /// A recurring link-check job could not be registered.
    #[error("link check scheduling failed: {0}")]
    Schedule(#[from] tokio_cron_scheduler::JobSchedulerError),
}
