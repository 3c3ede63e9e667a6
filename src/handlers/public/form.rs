// handlers/public/form.rs - GET /form/:token and POST /submit-form

use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, MessageResponse};
use crate::services::{FormContext, RedemptionRequest, ServiceError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    pub token: Option<String>,
    #[serde(flatten)]
    pub answers: RedemptionRequest,
}

/// GET /form/:token - Resolve a check-in link to the patient it greets
pub async fn get(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<FormContext> {
    let form = state.tokens().lookup(&token).await?;
    Ok(ApiResponse::success(form))
}

/// POST /submit-form - Redeem a token with the patient's answers
///
/// Expected Input:
/// ```json
/// { "token": "uuid", "message": "ok", "mood": 4, "stress": 2, "offline_session_requested": false }
/// ```
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<SubmitForm>, JsonRejection>,
) -> ApiResult<MessageResponse> {
    let Json(form) = payload?;
    let token = form
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ApiError::from(ServiceError::InvalidToken))?;

    let outcome = state.redemptions().redeem(token.trim(), form.answers).await?;

    Ok(ApiResponse::success(
        MessageResponse::new("Form submitted successfully").with_warning(outcome.warning),
    ))
}
