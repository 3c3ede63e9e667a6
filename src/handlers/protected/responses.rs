use axum::extract::{Query, State};

use crate::database::models::FormSubmission;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::IdQuery;

/// GET /responses?id= - Submitted check-in forms, newest first
pub async fn get(State(state): State<AppState>, Query(query): Query<IdQuery>) -> ApiResult<Vec<FormSubmission>> {
    let id = query.required()?;
    let submissions = state.records().submissions(id).await?;
    Ok(ApiResponse::success(submissions))
}
