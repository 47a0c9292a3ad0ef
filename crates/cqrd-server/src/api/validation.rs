use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cqrd_core::ContentType;
use cqrd_quality::schedule_link_check;
use cqrd_quality::types::{CheckCadence, LinkCheckOptions, LinkValidationResult, ValidationResult};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct ValidateContentBody {
    content: String,
    content_type: ContentType,
    #[serde(default)]
    rules: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct ValidateLinksBody {
    urls: Vec<String>,
    #[serde(flatten)]
    options: LinkCheckOptions,
}

#[derive(Debug, Deserialize)]
pub(super) struct ScheduleLinksBody {
    urls: Vec<String>,
    cadence: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ScheduledLinkCheck {
    job_id: Uuid,
    cadence: &'static str,
    url_count: usize,
}

/// Content validation never fails the request: a source outage degrades to
/// the advisory fallback result, so the handler is infallible.
pub(super) async fn validate_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ValidateContentBody>,
) -> Json<ApiResponse<ValidationResult>> {
    let result = state
        .validation
        .validate_content(
            &body.content,
            body.content_type,
            body.rules.as_deref(),
            body.metadata.as_ref(),
            body.use_cache,
        )
        .await;
    Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn validate_links(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ValidateLinksBody>,
) -> Json<ApiResponse<LinkValidationResult>> {
    let result = state.validation.validate_links(&body.urls, &body.options).await;
    Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn schedule_links(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<ScheduleLinksBody>,
) -> Result<Json<ApiResponse<ScheduledLinkCheck>>, ApiError> {
    if body.urls.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "urls must not be empty",
        ));
    }
    let cadence: CheckCadence = body
        .cadence
        .parse()
        .map_err(|e: String| ApiError::new(req_id.0.clone(), "validation_error", e))?;
    let url_count = body.urls.len();
    let job_id = schedule_link_check(
        &state.jobs,
        Arc::clone(&state.validation),
        body.urls,
        cadence,
    )
    .await
    .map_err(|e| super::map_quality_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse {
        data: ScheduledLinkCheck {
            job_id,
            cadence: cadence.as_str(),
            url_count,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
