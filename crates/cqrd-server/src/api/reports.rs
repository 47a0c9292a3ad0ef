use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use cqrd_report::{
    generate, ExportFormat, GenerateOptions, GeneratedReport, ReportExport, ReportTemplate,
    TemplateDefinition,
};

use super::{map_report_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct GenerateBody {
    template_id: String,
    #[serde(flatten)]
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
pub(super) struct ExportQuery {
    format: String,
}

pub(super) async fn list_templates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<ReportTemplate>>> {
    Json(ApiResponse {
        data: state.registry.list_templates(),
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn create_template(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(definition): Json<TemplateDefinition>,
) -> Result<Json<ApiResponse<ReportTemplate>>, ApiError> {
    let template = state
        .registry
        .create_template(&definition)
        .map_err(|e| map_report_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse {
        data: template,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn generate_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<ApiResponse<GeneratedReport>>, ApiError> {
    let Some(template) = state.registry.get_template(&body.template_id) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("template not found: {}", body.template_id),
        ));
    };
    let rendered = generate(&state.collector, &template, &body.options)
        .await
        .map_err(|e| map_report_error(req_id.0.clone(), &e))?;
    let report = state
        .store
        .insert(rendered)
        .map_err(|e| map_report_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse {
        data: report,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<GeneratedReport>>> {
    Json(ApiResponse {
        data: state.store.list(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Streams the stored payload back with its original content type and an
/// attachment disposition, rather than the JSON envelope.
pub(super) async fn download_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(report_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (report, payload) = state
        .store
        .download(report_id)
        .map_err(|e| map_report_error(req_id.0, &e))?;
    let filename = format!("report-{}.{}", report.id, report.format.file_extension());
    Ok((
        [
            (header::CONTENT_TYPE, report.format.mime_type().to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        payload,
    )
        .into_response())
}

pub(super) async fn export_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(report_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Json<ApiResponse<ReportExport>>, ApiError> {
    let format: ExportFormat = query
        .format
        .parse()
        .map_err(|e: String| ApiError::new(req_id.0.clone(), "validation_error", e))?;
    let export = state
        .store
        .export(report_id, format)
        .map_err(|e| map_report_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse {
        data: export,
        meta: ResponseMeta::new(req_id.0),
    }))
}
