use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub session_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
