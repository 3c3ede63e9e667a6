use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::note::PatientNote;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub well_being_score: Option<i32>,
    pub last_response_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when inserting a patient. Validation happens in the service layer.
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub last_response_date: Option<DateTime<Utc>>,
}

/// Therapist edits. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PatientChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub well_being_score: Option<i32>,
}

/// Dashboard projection: a patient plus only its most recent note
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientOverview {
    #[serde(flatten)]
    pub patient: Patient,
    pub latest_note: Option<PatientNote>,
}
