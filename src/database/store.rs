//! Persistence contract consumed by the services.
//!
//! Two backends implement it: [`PgStore`](crate::database::postgres::PgStore) for
//! production and [`MemoryStore`](crate::database::memory::MemoryStore) for local
//! development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::StoreResult;
use crate::database::models::{
    FormSubmission, NewPatient, NewSubmission, Patient, PatientChanges, PatientNote,
    PatientOverview, Session, Token,
};

/// Collections owned by a patient, in the order they are removed before the patient row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeStep {
    Submissions,
    Notes,
    Sessions,
    Tokens,
    Patient,
}

impl CascadeStep {
    /// Dependents first, aggregate root last
    pub const ORDER: [CascadeStep; 5] = [
        CascadeStep::Submissions,
        CascadeStep::Notes,
        CascadeStep::Sessions,
        CascadeStep::Tokens,
        CascadeStep::Patient,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            CascadeStep::Submissions => "form_submissions",
            CascadeStep::Notes => "patient_notes",
            CascadeStep::Sessions => "sessions",
            CascadeStep::Tokens => "tokens",
            CascadeStep::Patient => "patients",
        }
    }
}

impl std::fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Round trip to the backend, used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;

    // --- Patients ---
    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient>;

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>>;

    /// Case-insensitive email lookup
    async fn find_patient_by_email(&self, email: &str) -> StoreResult<Option<Patient>>;

    /// Patients annotated with their newest note. `Some(id)` narrows to one patient.
    async fn patient_overviews(&self, id: Option<Uuid>) -> StoreResult<Vec<PatientOverview>>;

    async fn update_patient(&self, id: Uuid, changes: PatientChanges) -> StoreResult<Option<Patient>>;

    /// Patients silent since `inactive_since` (or never heard from) holding no unused token
    async fn reminder_candidates(&self, inactive_since: DateTime<Utc>) -> StoreResult<Vec<Patient>>;

    /// Remove every row of one collection that belongs to the patient
    async fn delete_for_patient(&self, step: CascadeStep, patient_id: Uuid) -> StoreResult<u64>;

    // --- Tokens ---
    async fn insert_token(&self, patient_id: Uuid, token: &str) -> StoreResult<Token>;

    async fn find_token(&self, token: &str) -> StoreResult<Option<Token>>;

    /// Atomically flip the token from unused to used, record the submission and stamp
    /// the patient's last response. Returns `None` when the token was already used,
    /// in which case nothing is written.
    async fn redeem_token(&self, token: &Token, submission: NewSubmission) -> StoreResult<Option<FormSubmission>>;

    // --- Submissions ---
    /// Newest first
    async fn submissions_for(&self, patient_id: Uuid) -> StoreResult<Vec<FormSubmission>>;

    // --- Notes ---
    async fn insert_note(&self, patient_id: Uuid, note: &str) -> StoreResult<PatientNote>;

    /// Newest first
    async fn notes_for(&self, patient_id: Uuid) -> StoreResult<Vec<PatientNote>>;

    // --- Sessions ---
    async fn insert_session(&self, patient_id: Uuid, session_date: DateTime<Utc>) -> StoreResult<Session>;

    /// Earliest session first
    async fn sessions_for(&self, patient_id: Uuid) -> StoreResult<Vec<Session>>;
}
