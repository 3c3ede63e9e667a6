use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PatientNote {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
