use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::database::models::Token;
use crate::database::Store;
use crate::services::ServiceError;

/// What the public form page needs to greet the patient
#[derive(Debug, Clone, Serialize)]
pub struct FormContext {
    pub patient_name: String,
}

/// Issues single-use form tokens and resolves them for the form page
pub struct TokenService {
    store: Arc<dyn Store>,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an unused token for an existing patient. Sending the link is the caller's job.
    pub async fn issue(&self, patient_id: Uuid) -> Result<Token, ServiceError> {
        if self.store.find_patient(patient_id).await?.is_none() {
            return Err(ServiceError::PatientNotFound);
        }

        let value = Uuid::new_v4().to_string();
        let token = self.store.insert_token(patient_id, &value).await?;

        info!("Issued form token {} for patient {}", token.id, patient_id);
        Ok(token)
    }

    /// Resolve an unused token to the patient it was issued for
    pub async fn lookup(&self, value: &str) -> Result<FormContext, ServiceError> {
        let token = self
            .store
            .find_token(value)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if token.used {
            return Err(ServiceError::TokenAlreadyUsed);
        }

        let patient = self
            .store
            .find_patient(token.patient_id)
            .await?
            .ok_or(ServiceError::PatientNotFound)?;

        Ok(FormContext {
            patient_name: patient.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn issues_distinct_unused_tokens() {
        let ctx = TestContext::new();
        let patient = ctx.patient("Sarah Johnson", "sarah@example.com").await;
        let tokens = ctx.state.tokens();

        let first = tokens.issue(patient.id).await.unwrap();
        let second = tokens.issue(patient.id).await.unwrap();

        assert_ne!(first.token, second.token);
        assert!(!first.used);
        assert_eq!(first.patient_id, patient.id);
        assert!(Uuid::parse_str(&first.token).is_ok());
    }

    #[tokio::test]
    async fn refuses_unknown_patient() {
        let ctx = TestContext::new();
        let err = ctx.state.tokens().issue(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::PatientNotFound));
    }

    #[tokio::test]
    async fn lookup_resolves_patient_name() {
        let ctx = TestContext::new();
        let patient = ctx.patient("Sarah Johnson", "sarah@example.com").await;
        let token = ctx.state.tokens().issue(patient.id).await.unwrap();

        let form = ctx.state.tokens().lookup(&token.token).await.unwrap();
        assert_eq!(form.patient_name, "Sarah Johnson");
    }

    #[tokio::test]
    async fn lookup_rejects_unknown_token() {
        let ctx = TestContext::new();
        let err = ctx.state.tokens().lookup("nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidToken));
    }

    #[tokio::test]
    async fn issue_surfaces_store_failure() {
        let ctx = TestContext::new();
        let patient = ctx.patient("Sarah Johnson", "sarah@example.com").await;
        ctx.store.fail_table("tokens");

        let err = ctx.state.tokens().issue(patient.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
    }
}
