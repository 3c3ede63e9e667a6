use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{FormSubmission, Patient, PatientNote, Session};
use crate::database::Store;
use crate::notifications::{templates, Attachment, CalendarEvent, Notifier, OutgoingEmail};
use crate::services::{validation, ServiceError};

#[derive(Debug, Clone)]
pub struct ScheduledSession {
    pub session: Session,
    /// Set when the session was stored but the invite could not be sent
    pub warning: Option<String>,
}

/// Therapist-side records attached to a patient: notes, sessions and submitted forms
pub struct RecordsService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl RecordsService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn add_note(&self, patient_id: Uuid, note: Option<&str>) -> Result<PatientNote, ServiceError> {
        let note = validation::required("note", note)?;
        self.existing_patient(patient_id).await?;

        let created = self.store.insert_note(patient_id, &note).await?;
        info!("Added note {} for patient {}", created.id, patient_id);
        Ok(created)
    }

    pub async fn notes(&self, patient_id: Uuid) -> Result<Vec<PatientNote>, ServiceError> {
        Ok(self.store.notes_for(patient_id).await?)
    }

    pub async fn submissions(&self, patient_id: Uuid) -> Result<Vec<FormSubmission>, ServiceError> {
        Ok(self.store.submissions_for(patient_id).await?)
    }

    pub async fn sessions(&self, patient_id: Uuid) -> Result<Vec<Session>, ServiceError> {
        Ok(self.store.sessions_for(patient_id).await?)
    }

    pub async fn schedule_session(
        &self,
        patient_id: Uuid,
        session_date: DateTime<Utc>,
    ) -> Result<ScheduledSession, ServiceError> {
        let patient = self.existing_patient(patient_id).await?;
        let session = self.store.insert_session(patient_id, session_date).await?;
        info!("Scheduled session {} for patient {} at {}", session.id, patient_id, session_date);

        let warning = match self.send_invite(&patient, &session).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Session {} saved but invite to {} failed: {}", session.id, patient.email, e);
                Some(format!("Session scheduled, but the invite could not be sent: {e}"))
            }
        };

        Ok(ScheduledSession { session, warning })
    }

    async fn send_invite(&self, patient: &Patient, session: &Session) -> Result<(), ServiceError> {
        let (organizer_name, organizer_email) = self.notifier.sender();
        let event = CalendarEvent {
            uid: format!("{}@therapy-crm", session.id),
            start: session.session_date,
            duration: Duration::hours(1),
            title: "Therapy Session".to_string(),
            description: format!("Therapy session with therapist for {}.", patient.name),
            location: "Therapy Clinic or Online".to_string(),
            organizer_name: organizer_name.to_string(),
            organizer_email: organizer_email.to_string(),
        };

        let content = templates::session_invite(&patient.name, session.session_date);
        self.notifier
            .send(OutgoingEmail {
                to: patient.email.clone(),
                to_name: Some(patient.name.clone()),
                reply_to: None,
                subject: content.subject,
                text_body: content.text,
                html_body: content.html,
                attachment: Some(Attachment {
                    filename: "session.ics".to_string(),
                    content: event.to_ics(),
                    mime_type: "text/calendar".to_string(),
                }),
            })
            .await?;
        Ok(())
    }

    async fn existing_patient(&self, patient_id: Uuid) -> Result<Patient, ServiceError> {
        self.store
            .find_patient(patient_id)
            .await?
            .ok_or(ServiceError::PatientNotFound)
    }
}
