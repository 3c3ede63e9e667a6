use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub message: String,
    pub sent_to: Vec<String>,
}

/// POST /send-email (and GET /trigger-emails) - Run the reminder batch now
pub async fn send(State(state): State<AppState>) -> ApiResult<ReminderResponse> {
    let report = state.reminders().run(Utc::now()).await?;

    Ok(ApiResponse::success(ReminderResponse {
        message: report.message().to_string(),
        sent_to: report.sent_to,
    }))
}
