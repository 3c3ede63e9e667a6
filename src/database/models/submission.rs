use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

/// Patient answers as stored in the `response_data` column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseData {
    pub message: Option<String>,
    pub mood: Option<i32>,
    pub stress: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormSubmission {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub token_id: Uuid,
    pub response_data: Json<ResponseData>,
    pub offline_session_requested: bool,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub response_data: ResponseData,
    pub offline_session_requested: bool,
    pub submitted_at: DateTime<Utc>,
}
