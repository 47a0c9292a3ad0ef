use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use cqrd_core::MetricsPeriod;
use cqrd_quality::types::{AggregatedMetrics, MetricsFilter, QualityMetrics};

use super::{map_quality_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct MetricsQuery {
    #[serde(default)]
    period: Option<String>,
    #[serde(default = "default_use_cache")]
    use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(super) struct TrendsBody {
    content_ids: Vec<String>,
    #[serde(default)]
    period: Option<String>,
}

fn parse_period(request_id: &str, raw: Option<&str>) -> Result<MetricsPeriod, ApiError> {
    match raw {
        Some(value) => value.parse().map_err(|e: String| {
            ApiError::new(request_id.to_owned(), "validation_error", e)
        }),
        None => Ok(MetricsPeriod::default()),
    }
}

pub(super) async fn quality_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(content_id): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<ApiResponse<Vec<QualityMetrics>>>, ApiError> {
    let period = parse_period(&req_id.0, query.period.as_deref())?;
    let metrics = state
        .metrics
        .get_quality_metrics(&content_id, period, query.use_cache)
        .await
        .map_err(|e| map_quality_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse {
        data: metrics,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn aggregate_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(filter): Json<MetricsFilter>,
) -> Result<Json<ApiResponse<AggregatedMetrics>>, ApiError> {
    let aggregated = state
        .metrics
        .get_aggregated(&filter)
        .await
        .map_err(|e| map_quality_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse {
        data: aggregated,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Ids whose fetch fails are omitted from the map downstream, so the
/// handler itself only fails on an invalid period.
pub(super) async fn quality_trends(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<TrendsBody>,
) -> Result<Json<ApiResponse<HashMap<String, Vec<QualityMetrics>>>>, ApiError> {
    let period = parse_period(&req_id.0, body.period.as_deref())?;
    let trends = state
        .metrics
        .get_quality_trends(&body.content_ids, period)
        .await;
    Ok(Json(ApiResponse {
        data: trends,
        meta: ResponseMeta::new(req_id.0),
    }))
}
