use axum::extract::{rejection::JsonRejection, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::PatientNote;
use crate::middleware::{ApiResponse, ApiResult, MessageResponse};
use crate::state::AppState;

use super::IdQuery;

#[derive(Debug, Deserialize)]
pub struct NewNote {
    pub patient_id: Uuid,
    pub note: Option<String>,
}

/// GET /notes?id= - Therapist notes, newest first
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Vec<PatientNote>> {
    let id = query.required()?;
    let notes = state.records().notes(id).await?;
    Ok(ApiResponse::success(notes))
}

/// POST /notes - Attach a note to a patient
pub async fn post(
    State(state): State<AppState>,
    payload: Result<Json<NewNote>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    let note = state.records().add_note(request.patient_id, request.note.as_deref()).await?;
    Ok(ApiResponse::success(MessageResponse::new("Note added").with_id(note.id)))
}
