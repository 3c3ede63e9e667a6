use axum::extract::{rejection::JsonRejection, Query, State};
use axum::{Extension, Json};

use crate::database::models::PatientOverview;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, MessageResponse};
use crate::services::{CreatePatient, UpdatePatient};
use crate::state::AppState;

use super::IdQuery;

/// GET /patients[?id=] - Every patient with its latest note; a single id still yields an array
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Vec<PatientOverview>> {
    let id = query.optional()?;
    let patients = state.patients().overviews(id).await?;
    Ok(ApiResponse::success(patients))
}

/// POST /patients - Register a patient
pub async fn post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreatePatient>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(request) = payload?;
    let id = state.patients().create(request).await?;

    tracing::info!("Patient {} added by {}", id, auth_user.subject);
    Ok(ApiResponse::success(MessageResponse::new("Patient added").with_id(id)))
}

/// PATCH /patients?id= - Therapist edits to name, phone or well-being score
pub async fn patch(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    payload: Result<Json<UpdatePatient>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let id = query.required()?;
    let Json(request) = payload?;
    state.patients().update(id, request).await?;
    Ok(ApiResponse::success(MessageResponse::new("Patient updated").with_id(id)))
}

/// DELETE /patients?id= - Remove a patient and everything recorded about them
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<IdQuery>,
) -> ApiResult<MessageResponse> {
    let id = query.required()?;
    state.patients().delete(id).await?;

    tracing::info!("Patient {} deleted by {}", id, auth_user.subject);
    Ok(ApiResponse::success(MessageResponse::new("Patient deleted")))
}
