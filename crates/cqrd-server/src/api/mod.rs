mod metrics;
mod reports;
mod schedules;
mod validation;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_cron_scheduler::JobScheduler;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use cqrd_quality::{MetricsAggregator, QualityError, ValidationService};
use cqrd_report::{ReportCollector, ReportError, ReportStore, ScheduleBoard, TemplateRegistry};

use crate::middleware::{request_id, RequestId};

/// Shared handles for everything the handlers touch.
#[derive(Clone)]
pub struct AppState {
    pub validation: Arc<ValidationService>,
    pub metrics: Arc<MetricsAggregator>,
    pub registry: Arc<TemplateRegistry>,
    pub collector: Arc<ReportCollector>,
    pub store: Arc<ReportStore>,
    pub board: Arc<ScheduleBoard>,
    pub jobs: JobScheduler,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    templates: usize,
    schedules: usize,
    stored_reports: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_quality_error(request_id: String, error: &QualityError) -> ApiError {
    match error {
        QualityError::InvalidFilter(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        QualityError::Source(e) => {
            tracing::error!(error = %e, "source query failed");
            ApiError::new(request_id, "internal_error", "data source query failed")
        }
        QualityError::Schedule(e) => {
            tracing::error!(error = %e, "job registration failed");
            ApiError::new(request_id, "internal_error", "job registration failed")
        }
    }
}

pub(super) fn map_report_error(request_id: String, error: &ReportError) -> ApiError {
    match error {
        ReportError::TemplateNotFound(id) => {
            ApiError::new(request_id, "not_found", format!("template not found: {id}"))
        }
        ReportError::ReportNotFound(id) => {
            ApiError::new(request_id, "not_found", format!("report not found: {id}"))
        }
        ReportError::InvalidTemplate(message) | ReportError::InvalidSchedule(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        ReportError::DuplicateReport(id) => {
            ApiError::new(request_id, "conflict", format!("report {id} already stored"))
        }
        other => {
            tracing::error!(error = %other, "report operation failed");
            ApiError::new(request_id, "internal_error", "report operation failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/validation/content",
            post(validation::validate_content),
        )
        .route("/api/v1/validation/links", post(validation::validate_links))
        .route(
            "/api/v1/validation/links/schedule",
            post(validation::schedule_links),
        )
        .route(
            "/api/v1/metrics/aggregate",
            post(metrics::aggregate_metrics),
        )
        .route("/api/v1/metrics/trends", post(metrics::quality_trends))
        .route("/api/v1/metrics/{content_id}", get(metrics::quality_metrics))
        .route(
            "/api/v1/reports/templates",
            get(reports::list_templates).post(reports::create_template),
        )
        .route("/api/v1/reports/generate", post(reports::generate_report))
        .route("/api/v1/reports", get(reports::list_reports))
        .route(
            "/api/v1/reports/{report_id}/download",
            get(reports::download_report),
        )
        .route(
            "/api/v1/reports/{report_id}/export",
            get(reports::export_report),
        )
        .route(
            "/api/v1/reports/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route(
            "/api/v1/reports/schedules/{schedule_id}",
            delete(schedules::delete_schedule),
        )
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                templates: state.registry.list_templates().len(),
                schedules: state.board.list().len(),
                stored_reports: state.store.list().len(),
            },
            meta,
        }),
    )
}
