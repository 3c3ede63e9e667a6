use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, StoreResult};
use crate::database::models::{
    FormSubmission, NewPatient, NewSubmission, Patient, PatientChanges, PatientNote,
    PatientOverview, Session, Token,
};
use crate::database::store::{CascadeStep, Store};

#[derive(Default)]
struct Tables {
    patients: Vec<Patient>,
    tokens: Vec<Token>,
    submissions: Vec<FormSubmission>,
    notes: Vec<PatientNote>,
    sessions: Vec<Session>,
}

impl Tables {
    /// Newest note for a patient; among equal timestamps the later insert wins
    fn latest_note(&self, patient_id: Uuid) -> Option<PatientNote> {
        self.notes
            .iter()
            .filter(|n| n.patient_id == patient_id)
            .fold(None, |best: Option<&PatientNote>, n| match best {
                Some(b) if b.created_at > n.created_at => Some(b),
                _ => Some(n),
            })
            .cloned()
    }
}

/// Process-local store. Every operation runs under one lock, so token redemption
/// is atomic with respect to concurrent requests.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    outages: std::sync::Mutex<std::collections::HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation touching `table` fail until the store is dropped
    #[cfg(test)]
    pub fn fail_table(&self, table: &'static str) {
        self.outages.lock().unwrap().insert(table);
    }

    #[cfg(test)]
    fn check(&self, table: &'static str) -> StoreResult<()> {
        if self.outages.lock().unwrap().contains(table) {
            return Err(DatabaseError::Unavailable(format!("{table} is unavailable")));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check(&self, _table: &'static str) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient> {
        self.check("patients")?;
        let mut tables = self.tables.write().await;

        let email_key = patient.email.to_lowercase();
        if tables.patients.iter().any(|p| p.email.to_lowercase() == email_key) {
            return Err(DatabaseError::UniqueViolation("patients_email_lower_idx".to_string()));
        }

        let row = Patient {
            id: Uuid::new_v4(),
            name: patient.name,
            email: patient.email,
            phone: patient.phone,
            well_being_score: None,
            last_response_date: patient.last_response_date,
            created_at: Utc::now(),
        };
        tables.patients.push(row.clone());
        Ok(row)
    }

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        self.check("patients")?;
        let tables = self.tables.read().await;
        Ok(tables.patients.iter().find(|p| p.id == id).cloned())
    }

    async fn find_patient_by_email(&self, email: &str) -> StoreResult<Option<Patient>> {
        self.check("patients")?;
        let tables = self.tables.read().await;
        let key = email.to_lowercase();
        Ok(tables.patients.iter().find(|p| p.email.to_lowercase() == key).cloned())
    }

    async fn patient_overviews(&self, id: Option<Uuid>) -> StoreResult<Vec<PatientOverview>> {
        self.check("patients")?;
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .iter()
            .filter(|p| id.map_or(true, |id| p.id == id))
            .map(|p| PatientOverview {
                patient: p.clone(),
                latest_note: tables.latest_note(p.id),
            })
            .collect())
    }

    async fn update_patient(&self, id: Uuid, changes: PatientChanges) -> StoreResult<Option<Patient>> {
        self.check("patients")?;
        let mut tables = self.tables.write().await;
        let Some(patient) = tables.patients.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            patient.name = name;
        }
        if let Some(phone) = changes.phone {
            patient.phone = Some(phone);
        }
        if let Some(score) = changes.well_being_score {
            patient.well_being_score = Some(score);
        }
        Ok(Some(patient.clone()))
    }

    async fn reminder_candidates(&self, inactive_since: DateTime<Utc>) -> StoreResult<Vec<Patient>> {
        self.check("patients")?;
        self.check("tokens")?;
        let tables = self.tables.read().await;
        Ok(tables
            .patients
            .iter()
            .filter(|p| p.last_response_date.map_or(true, |at| at <= inactive_since))
            .filter(|p| !tables.tokens.iter().any(|t| t.patient_id == p.id && !t.used))
            .cloned()
            .collect())
    }

    async fn delete_for_patient(&self, step: CascadeStep, patient_id: Uuid) -> StoreResult<u64> {
        self.check(step.table())?;
        let mut tables = self.tables.write().await;

        fn retain_count<T>(rows: &mut Vec<T>, keep: impl Fn(&T) -> bool) -> u64 {
            let before = rows.len();
            rows.retain(keep);
            (before - rows.len()) as u64
        }

        let removed = match step {
            CascadeStep::Submissions => retain_count(&mut tables.submissions, |r| r.patient_id != patient_id),
            CascadeStep::Notes => retain_count(&mut tables.notes, |r| r.patient_id != patient_id),
            CascadeStep::Sessions => retain_count(&mut tables.sessions, |r| r.patient_id != patient_id),
            CascadeStep::Tokens => retain_count(&mut tables.tokens, |r| r.patient_id != patient_id),
            CascadeStep::Patient => retain_count(&mut tables.patients, |r| r.id != patient_id),
        };
        Ok(removed)
    }

    async fn insert_token(&self, patient_id: Uuid, token: &str) -> StoreResult<Token> {
        self.check("tokens")?;
        let mut tables = self.tables.write().await;
        if tables.tokens.iter().any(|t| t.token == token) {
            return Err(DatabaseError::UniqueViolation("tokens_token_key".to_string()));
        }
        let row = Token {
            id: Uuid::new_v4(),
            patient_id,
            token: token.to_string(),
            used: false,
            created_at: Utc::now(),
        };
        tables.tokens.push(row.clone());
        Ok(row)
    }

    async fn find_token(&self, token: &str) -> StoreResult<Option<Token>> {
        self.check("tokens")?;
        let tables = self.tables.read().await;
        Ok(tables.tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn redeem_token(&self, token: &Token, submission: NewSubmission) -> StoreResult<Option<FormSubmission>> {
        self.check("tokens")?;
        self.check("form_submissions")?;
        let mut tables = self.tables.write().await;

        let Some(stored) = tables.tokens.iter_mut().find(|t| t.id == token.id && !t.used) else {
            return Ok(None);
        };
        stored.used = true;

        let row = FormSubmission {
            id: Uuid::new_v4(),
            patient_id: token.patient_id,
            token_id: token.id,
            response_data: Json(submission.response_data),
            offline_session_requested: submission.offline_session_requested,
            submitted_at: submission.submitted_at,
        };
        tables.submissions.push(row.clone());

        if let Some(patient) = tables.patients.iter_mut().find(|p| p.id == token.patient_id) {
            patient.last_response_date = Some(submission.submitted_at);
        }

        Ok(Some(row))
    }

    async fn submissions_for(&self, patient_id: Uuid) -> StoreResult<Vec<FormSubmission>> {
        self.check("form_submissions")?;
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .submissions
            .iter()
            .rev()
            .filter(|s| s.patient_id == patient_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn insert_note(&self, patient_id: Uuid, note: &str) -> StoreResult<PatientNote> {
        self.check("patient_notes")?;
        let mut tables = self.tables.write().await;
        let row = PatientNote {
            id: Uuid::new_v4(),
            patient_id,
            note: note.to_string(),
            created_at: Utc::now(),
        };
        tables.notes.push(row.clone());
        Ok(row)
    }

    async fn notes_for(&self, patient_id: Uuid) -> StoreResult<Vec<PatientNote>> {
        self.check("patient_notes")?;
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .notes
            .iter()
            .rev()
            .filter(|n| n.patient_id == patient_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_session(&self, patient_id: Uuid, session_date: DateTime<Utc>) -> StoreResult<Session> {
        self.check("sessions")?;
        let mut tables = self.tables.write().await;
        let row = Session {
            id: Uuid::new_v4(),
            patient_id,
            session_date,
            created_at: Utc::now(),
        };
        tables.sessions.push(row.clone());
        Ok(row)
    }

    async fn sessions_for(&self, patient_id: Uuid) -> StoreResult<Vec<Session>> {
        self.check("sessions")?;
        let tables = self.tables.read().await;
        let mut rows: Vec<_> = tables
            .sessions
            .iter()
            .filter(|s| s.patient_id == patient_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.session_date.cmp(&b.session_date));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ResponseData;

    fn new_patient(email: &str) -> NewPatient {
        NewPatient {
            name: "Test Patient".to_string(),
            email: email.to_string(),
            phone: None,
            last_response_date: None,
        }
    }

    fn answers() -> NewSubmission {
        NewSubmission {
            response_data: ResponseData {
                message: Some("ok".to_string()),
                mood: Some(3),
                stress: Some(3),
            },
            offline_session_requested: false,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email_ignoring_case() {
        let store = MemoryStore::new();
        store.insert_patient(new_patient("sarah@example.com")).await.unwrap();
        let err = store.insert_patient(new_patient("SARAH@example.com")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn redeem_flips_token_once() {
        let store = MemoryStore::new();
        let patient = store.insert_patient(new_patient("a@example.com")).await.unwrap();
        let token = store.insert_token(patient.id, "tok-1").await.unwrap();

        let first = store.redeem_token(&token, answers()).await.unwrap();
        assert!(first.is_some());
        let second = store.redeem_token(&token, answers()).await.unwrap();
        assert!(second.is_none());

        assert_eq!(store.submissions_for(patient.id).await.unwrap().len(), 1);
        let patient = store.find_patient(patient.id).await.unwrap().unwrap();
        assert!(patient.last_response_date.is_some());
    }

    #[tokio::test]
    async fn latest_note_prefers_newest() {
        let store = MemoryStore::new();
        let patient = store.insert_patient(new_patient("b@example.com")).await.unwrap();
        store.insert_note(patient.id, "first").await.unwrap();
        store.insert_note(patient.id, "second").await.unwrap();

        let overviews = store.patient_overviews(None).await.unwrap();
        assert_eq!(overviews.len(), 1);
        assert_eq!(overviews[0].latest_note.as_ref().unwrap().note, "second");
        assert_eq!(store.notes_for(patient.id).await.unwrap()[0].note, "second");
    }

    #[tokio::test]
    async fn outage_fails_only_the_named_table() {
        let store = MemoryStore::new();
        let patient = store.insert_patient(new_patient("c@example.com")).await.unwrap();
        store.fail_table("sessions");

        assert!(store.delete_for_patient(CascadeStep::Notes, patient.id).await.is_ok());
        assert!(store.delete_for_patient(CascadeStep::Sessions, patient.id).await.is_err());
    }
}
