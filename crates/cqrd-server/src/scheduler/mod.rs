//! Background job driver.
//!
//! Initialises a [`JobScheduler`] at server startup for recurring link
//! checks and spawns the ticker that runs due report schedules.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};

use cqrd_core::AppConfig;
use cqrd_quality::types::CheckCadence;
use cqrd_quality::{schedule_link_check, QualityError, ValidationService};
use cqrd_report::schedule::RunOutcome;
use cqrd_report::{
    generate, GenerateOptions, GeneratedReport, ReportCollector, ReportSchedule, ReportStore,
    ScheduleBoard, TemplateRegistry,
};
use cqrd_source::types::TelemetryEvent;
use cqrd_source::SourceClient;

/// Builds and starts the cron scheduler.
///
/// Registers the boot-time link check when `CQRD_LINK_CHECK_URLS` is set;
/// further link-check jobs are added at runtime through the API. The
/// returned handle must be kept alive for the lifetime of the process,
/// dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    config: &AppConfig,
    validation: Arc<ValidationService>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_boot_link_check(&scheduler, config, validation).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring link check configured through the environment.
///
/// A cadence value that does not parse skips the job with a warning rather
/// than failing startup; the URLs stay checkable through the API.
async fn register_boot_link_check(
    scheduler: &JobScheduler,
    config: &AppConfig,
    validation: Arc<ValidationService>,
) -> Result<(), JobSchedulerError> {
    if config.link_check_urls.is_empty() {
        return Ok(());
    }

    let cadence = match config.link_check_cadence.parse::<CheckCadence>() {
        Ok(cadence) => cadence,
        Err(e) => {
            tracing::warn!(error = %e, "scheduler: invalid link check cadence, boot job skipped");
            return Ok(());
        }
    };

    match schedule_link_check(
        scheduler,
        validation,
        config.link_check_urls.clone(),
        cadence,
    )
    .await
    {
        Ok(job_id) => {
            tracing::info!(
                job_id = %job_id,
                count = config.link_check_urls.len(),
                cadence = %cadence,
                "scheduler: registered boot link check"
            );
            Ok(())
        }
        Err(QualityError::Schedule(e)) => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "scheduler: failed to register boot link check");
            Ok(())
        }
    }
}

/// Spawns the loop that claims due report schedules and runs them.
///
/// Each claim runs as its own task so one slow report cannot hold up the
/// rest of the batch. The first tick fires immediately, so schedules that
/// came back overdue from the remote store run right after startup.
pub fn spawn_report_ticker(
    board: Arc<ScheduleBoard>,
    registry: Arc<TemplateRegistry>,
    collector: Arc<ReportCollector>,
    store: Arc<ReportStore>,
    source: Arc<SourceClient>,
    tick: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            for schedule in board.claim_due(Utc::now()) {
                let board = Arc::clone(&board);
                let registry = Arc::clone(&registry);
                let collector = Arc::clone(&collector);
                let store = Arc::clone(&store);
                let source = Arc::clone(&source);
                tokio::spawn(async move {
                    run_scheduled_report(&board, &registry, &collector, &store, &source, schedule)
                        .await;
                });
            }
        }
    })
}

/// Generate, store, and complete one claimed schedule.
///
/// Every exit path reports completion back to the board; a claim that never
/// completed would block the schedule forever.
async fn run_scheduled_report(
    board: &ScheduleBoard,
    registry: &TemplateRegistry,
    collector: &ReportCollector,
    store: &ReportStore,
    source: &SourceClient,
    schedule: ReportSchedule,
) {
    tracing::info!(
        schedule_id = %schedule.id,
        template_id = %schedule.template_id,
        "scheduler: starting scheduled report run"
    );

    let Some(template) = registry.get_template(&schedule.template_id) else {
        tracing::error!(
            schedule_id = %schedule.id,
            template_id = %schedule.template_id,
            "scheduler: template missing for schedule"
        );
        board
            .complete_run(schedule.id, Utc::now(), RunOutcome::Failure)
            .await;
        return;
    };

    let outcome = match generate(collector, &template, &GenerateOptions::default()).await {
        Ok(rendered) => match store.insert(rendered) {
            Ok(report) => {
                tracing::info!(
                    schedule_id = %schedule.id,
                    report_id = %report.id,
                    size_bytes = report.size_bytes,
                    "scheduler: scheduled report stored"
                );
                post_report_event(source, &schedule, &report).await;
                RunOutcome::Success
            }
            Err(e) => {
                tracing::error!(
                    schedule_id = %schedule.id,
                    error = %e,
                    "scheduler: failed to store scheduled report"
                );
                RunOutcome::Failure
            }
        },
        Err(e) => {
            tracing::error!(
                schedule_id = %schedule.id,
                error = %e,
                "scheduler: scheduled report generation failed"
            );
            RunOutcome::Failure
        }
    };

    board.complete_run(schedule.id, Utc::now(), outcome).await;
}

/// Best-effort telemetry after a successful run; failures are logged and
/// dropped.
async fn post_report_event(
    source: &SourceClient,
    schedule: &ReportSchedule,
    report: &GeneratedReport,
) {
    let event = TelemetryEvent {
        name: "report_generated".to_owned(),
        occurred_at: Utc::now(),
        properties: serde_json::json!({
            "report_id": report.id,
            "template_id": report.template_id,
            "schedule_id": schedule.id,
            "format": report.format.as_str(),
        }),
    };
    if let Err(e) = source.post_event(&event).await {
        tracing::debug!(error = %e, "scheduler: telemetry post failed");
    }
}
