use axum::extract::{rejection::JsonRejection, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::Session;
use crate::middleware::{ApiResponse, ApiResult, MessageResponse};
use crate::state::AppState;

use super::IdQuery;

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub patient_id: Uuid,
    pub session_date: DateTime<Utc>,
}

/// GET /sessions?id= - Scheduled sessions by date
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Vec<Session>> {
    let id = query.required()?;
    let sessions = state.records().sessions(id).await?;
    Ok(ApiResponse::success(sessions))
}

/// POST /notify-session - Book a session and email the patient a calendar invite
pub async fn notify(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    let scheduled = state
        .records()
        .schedule_session(request.patient_id, request.session_date)
        .await?;

    let message = if scheduled.warning.is_some() {
        "Session scheduled"
    } else {
        "Session scheduled and patient notified"
    };

    Ok(ApiResponse::success(
        MessageResponse::new(message)
            .with_id(scheduled.session.id)
            .with_warning(scheduled.warning),
    ))
}
