mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use cqrd_quality::{MetricsAggregator, ValidationService};
use cqrd_report::{ReportCollector, ReportStore, ScheduleBoard, TemplateRegistry};
use cqrd_source::SourceClient;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(cqrd_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let source = Arc::new(SourceClient::new(&config)?);
    let validation = Arc::new(ValidationService::new(
        Arc::clone(&source),
        Duration::from_secs(config.validation_ttl_secs),
        Duration::from_secs(config.link_ttl_secs),
    ));
    let metrics = Arc::new(MetricsAggregator::new(
        Arc::clone(&source),
        Duration::from_secs(config.metrics_ttl_secs),
        Duration::from_secs(config.aggregate_ttl_secs),
    ));

    let registry = Arc::new(TemplateRegistry::with_builtins());
    if config.templates_path.exists() {
        let loaded = registry.load_yaml(&config.templates_path)?;
        tracing::info!(
            count = loaded,
            path = %config.templates_path.display(),
            "loaded report templates"
        );
    }

    let collector = Arc::new(ReportCollector::new(
        Arc::clone(&metrics),
        Arc::clone(&validation),
    ));
    let store = Arc::new(ReportStore::new(config.max_stored_reports));
    let board = Arc::new(ScheduleBoard::new(Arc::clone(&source)));
    match board.load().await {
        Ok(count) => tracing::info!(count, "restored report schedules"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to restore report schedules, starting empty");
        }
    }

    let jobs = scheduler::build_scheduler(&config, Arc::clone(&validation)).await?;
    let _ticker = scheduler::spawn_report_ticker(
        Arc::clone(&board),
        Arc::clone(&registry),
        Arc::clone(&collector),
        Arc::clone(&store),
        Arc::clone(&source),
        Duration::from_secs(config.scheduler_tick_secs),
    );

    let mut caches = validation.caches();
    caches.extend(metrics.caches());
    let _sweeper = cqrd_cache::spawn_sweeper(caches, Duration::from_secs(config.cache_sweep_secs));

    let app = build_app(AppState {
        validation,
        metrics,
        registry,
        collector,
        store,
        board,
        jobs,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
