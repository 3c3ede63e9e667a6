use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Single-use form access credential. `used` only ever moves from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub token: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}
