use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::StoreResult;
use crate::database::models::{
    FormSubmission, NewPatient, NewSubmission, Patient, PatientChanges, PatientNote,
    PatientOverview, Session, Token,
};
use crate::database::store::{CascadeStep, Store};

const PATIENT_COLUMNS: &str =
    "id, name, email, phone, well_being_score, last_response_date, created_at";
const TOKEN_COLUMNS: &str = "id, patient_id, token, used, created_at";
const SUBMISSION_COLUMNS: &str =
    "id, patient_id, token_id, response_data, offline_session_requested, submitted_at";

/// Postgres-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flat row for the patient + latest note lateral join
#[derive(FromRow)]
struct OverviewRow {
    id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    well_being_score: Option<i32>,
    last_response_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    note_id: Option<Uuid>,
    note_text: Option<String>,
    note_created_at: Option<DateTime<Utc>>,
}

impl From<OverviewRow> for PatientOverview {
    fn from(row: OverviewRow) -> Self {
        let latest_note = match (row.note_id, row.note_text, row.note_created_at) {
            (Some(id), Some(note), Some(created_at)) => Some(PatientNote {
                id,
                patient_id: row.id,
                note,
                created_at,
            }),
            _ => None,
        };

        PatientOverview {
            patient: Patient {
                id: row.id,
                name: row.name,
                email: row.email,
                phone: row.phone,
                well_being_score: row.well_being_score,
                last_response_date: row.last_response_date,
                created_at: row.created_at,
            },
            latest_note,
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_patient(&self, patient: NewPatient) -> StoreResult<Patient> {
        let sql = format!(
            "INSERT INTO patients (name, email, phone, last_response_date)
             VALUES ($1, $2, $3, $4)
             RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Patient>(&sql)
            .bind(&patient.name)
            .bind(&patient.email)
            .bind(&patient.phone)
            .bind(patient.last_response_date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_patient(&self, id: Uuid) -> StoreResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        let row = sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_patient_by_email(&self, email: &str) -> StoreResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE lower(email) = lower($1) LIMIT 1");
        let row = sqlx::query_as::<_, Patient>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn patient_overviews(&self, id: Option<Uuid>) -> StoreResult<Vec<PatientOverview>> {
        let rows = sqlx::query_as::<_, OverviewRow>(
            "SELECT p.id, p.name, p.email, p.phone, p.well_being_score, p.last_response_date, p.created_at,
                    n.id AS note_id, n.note AS note_text, n.created_at AS note_created_at
             FROM patients p
             LEFT JOIN LATERAL (
                 SELECT id, note, created_at
                 FROM patient_notes
                 WHERE patient_id = p.id
                 ORDER BY created_at DESC
                 LIMIT 1
             ) n ON true
             WHERE ($1::uuid IS NULL OR p.id = $1)
             ORDER BY p.created_at ASC, p.id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PatientOverview::from).collect())
    }

    async fn update_patient(&self, id: Uuid, changes: PatientChanges) -> StoreResult<Option<Patient>> {
        let sql = format!(
            "UPDATE patients
             SET name = COALESCE($2, name),
                 phone = COALESCE($3, phone),
                 well_being_score = COALESCE($4, well_being_score)
             WHERE id = $1
             RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Patient>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.phone)
            .bind(changes.well_being_score)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn reminder_candidates(&self, inactive_since: DateTime<Utc>) -> StoreResult<Vec<Patient>> {
        let sql = format!(
            "SELECT {PATIENT_COLUMNS}
             FROM patients p
             WHERE (p.last_response_date IS NULL OR p.last_response_date <= $1)
               AND NOT EXISTS (
                   SELECT 1 FROM tokens t WHERE t.patient_id = p.id AND t.used = false
               )
             ORDER BY p.created_at ASC, p.id ASC"
        );
        let rows = sqlx::query_as::<_, Patient>(&sql)
            .bind(inactive_since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn delete_for_patient(&self, step: CascadeStep, patient_id: Uuid) -> StoreResult<u64> {
        // Table names come from a closed enum, never from input
        let sql = match step {
            CascadeStep::Patient => "DELETE FROM patients WHERE id = $1".to_string(),
            other => format!("DELETE FROM {} WHERE patient_id = $1", other.table()),
        };
        let result = sqlx::query(&sql).bind(patient_id).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_token(&self, patient_id: Uuid, token: &str) -> StoreResult<Token> {
        let sql = format!(
            "INSERT INTO tokens (patient_id, token, used) VALUES ($1, $2, false) RETURNING {TOKEN_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Token>(&sql)
            .bind(patient_id)
            .bind(token)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_token(&self, token: &str) -> StoreResult<Option<Token>> {
        let sql = format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token = $1");
        let row = sqlx::query_as::<_, Token>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn redeem_token(&self, token: &Token, submission: NewSubmission) -> StoreResult<Option<FormSubmission>> {
        let mut tx = self.pool.begin().await?;

        // Conditional flip: a concurrent redemption that got here first leaves zero rows
        let claimed = sqlx::query("UPDATE tokens SET used = true WHERE id = $1 AND used = false")
            .bind(token.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let sql = format!(
            "INSERT INTO form_submissions (patient_id, token_id, response_data, offline_session_requested, submitted_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {SUBMISSION_COLUMNS}"
        );
        let created = sqlx::query_as::<_, FormSubmission>(&sql)
            .bind(token.patient_id)
            .bind(token.id)
            .bind(Json(submission.response_data))
            .bind(submission.offline_session_requested)
            .bind(submission.submitted_at)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE patients SET last_response_date = $1 WHERE id = $2")
            .bind(submission.submitted_at)
            .bind(token.patient_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    async fn submissions_for(&self, patient_id: Uuid) -> StoreResult<Vec<FormSubmission>> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM form_submissions WHERE patient_id = $1 ORDER BY submitted_at DESC"
        );
        let rows = sqlx::query_as::<_, FormSubmission>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_note(&self, patient_id: Uuid, note: &str) -> StoreResult<PatientNote> {
        let row = sqlx::query_as::<_, PatientNote>(
            "INSERT INTO patient_notes (patient_id, note) VALUES ($1, $2)
             RETURNING id, patient_id, note, created_at",
        )
        .bind(patient_id)
        .bind(note)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn notes_for(&self, patient_id: Uuid) -> StoreResult<Vec<PatientNote>> {
        let rows = sqlx::query_as::<_, PatientNote>(
            "SELECT id, patient_id, note, created_at FROM patient_notes
             WHERE patient_id = $1 ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_session(&self, patient_id: Uuid, session_date: DateTime<Utc>) -> StoreResult<Session> {
        let row = sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (patient_id, session_date) VALUES ($1, $2)
             RETURNING id, patient_id, session_date, created_at",
        )
        .bind(patient_id)
        .bind(session_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn sessions_for(&self, patient_id: Uuid) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, Session>(
            "SELECT id, patient_id, session_date, created_at FROM sessions
             WHERE patient_id = $1 ORDER BY session_date ASC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
