use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use chrono_tz::Tz;
use serde::Deserialize;
use uuid::Uuid;

use cqrd_report::schedule::parse_time_of_day;
use cqrd_report::{Frequency, NewSchedule, ReportSchedule};

use super::{map_report_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct CreateScheduleBody {
    template_id: String,
    frequency: String,
    time_of_day: String,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default)]
    recipients: Vec<String>,
}

fn default_timezone() -> String {
    "UTC".to_owned()
}

pub(super) async fn create_schedule(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateScheduleBody>,
) -> Result<Json<ApiResponse<ReportSchedule>>, ApiError> {
    if state.registry.get_template(&body.template_id).is_none() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("template not found: {}", body.template_id),
        ));
    }
    let frequency: Frequency = body
        .frequency
        .parse()
        .map_err(|e: String| ApiError::new(req_id.0.clone(), "validation_error", e))?;
    let time_of_day = parse_time_of_day(&body.time_of_day)
        .map_err(|e| map_report_error(req_id.0.clone(), &e))?;
    let timezone: Tz = body.timezone.parse().map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("unknown timezone '{}'", body.timezone),
        )
    })?;

    let schedule = state
        .board
        .schedule(
            NewSchedule {
                template_id: body.template_id,
                frequency,
                time_of_day,
                timezone,
                recipients: body.recipients,
            },
            Utc::now(),
        )
        .await;
    Ok(Json(ApiResponse {
        data: schedule,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_schedules(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<ReportSchedule>>> {
    Json(ApiResponse {
        data: state.board.list(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Disables the schedule and persists that state; the entry stays listable
/// so the remote store keeps its history.
pub(super) async fn delete_schedule(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ReportSchedule>>, ApiError> {
    if !state.board.unschedule(schedule_id).await {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("schedule not found: {schedule_id}"),
        ));
    }
    let schedule = state.board.get(schedule_id).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("schedule not found: {schedule_id}"),
        )
    })?;
    Ok(Json(ApiResponse {
        data: schedule,
        meta: ResponseMeta::new(req_id.0),
    }))
}
