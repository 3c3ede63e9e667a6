use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::database::models::{FormSubmission, NewSubmission, ResponseData};
use crate::database::Store;
use crate::notifications::{templates, Notifier, OutgoingEmail};
use crate::services::{validation, ServiceError};

/// Answers posted from the check-in form. Scale answers stay untyped until the token
/// has been checked, so a malformed answer is reported as a payload error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedemptionRequest {
    pub message: Option<String>,
    pub mood: Option<Value>,
    pub stress: Option<Value>,
    #[serde(default)]
    pub offline_session_requested: bool,
}

#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    pub submission_id: Uuid,
    /// Set when the submission committed but the therapist could not be notified
    pub warning: Option<String>,
}

/// Consumes form tokens: one token, one submission
pub struct RedemptionService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    config: Arc<AppConfig>,
}

impl RedemptionService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, config: Arc<AppConfig>) -> Self {
        Self { store, notifier, config }
    }

    pub async fn redeem(&self, value: &str, request: RedemptionRequest) -> Result<RedemptionOutcome, ServiceError> {
        let token = self
            .store
            .find_token(value)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if token.used {
            return Err(ServiceError::TokenAlreadyUsed);
        }

        let mood = validation::form_scale("mood", request.mood.as_ref())?;
        let stress = validation::form_scale("stress", request.stress.as_ref())?;

        let submission = NewSubmission {
            response_data: ResponseData {
                message: request.message,
                mood,
                stress,
            },
            offline_session_requested: request.offline_session_requested,
            submitted_at: Utc::now(),
        };

        // Lost the race to a concurrent redemption of the same token
        let created = self
            .store
            .redeem_token(&token, submission)
            .await?
            .ok_or(ServiceError::TokenAlreadyUsed)?;

        info!(
            "Token {} redeemed, submission {} recorded for patient {}",
            token.id, created.id, created.patient_id
        );

        let warning = match self.notify_therapist(&created).await {
            Ok(()) => None,
            Err(e) => {
                warn!("Submission {} saved but therapist notification failed: {}", created.id, e);
                Some(format!("Form submitted, but the therapist could not be notified: {e}"))
            }
        };

        Ok(RedemptionOutcome {
            submission_id: created.id,
            warning,
        })
    }

    async fn notify_therapist(&self, submission: &FormSubmission) -> Result<(), ServiceError> {
        let patient = self
            .store
            .find_patient(submission.patient_id)
            .await?
            .ok_or(ServiceError::PatientNotFound)?;

        let content = templates::therapist_notice(
            &patient,
            &submission.response_data,
            submission.offline_session_requested,
            &self.config.patient_url(patient.id),
        );

        self.notifier
            .send(OutgoingEmail {
                to: self.config.email.therapist_email.clone(),
                to_name: None,
                reply_to: Some(patient.email.clone()),
                subject: content.subject,
                text_body: content.text,
                html_body: content.html,
                attachment: None,
            })
            .await?;
        Ok(())
    }
}
