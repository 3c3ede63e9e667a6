use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::database::models::Patient;
use crate::database::Store;
use crate::notifications::{templates, Notifier, OutgoingEmail};
use crate::services::{ServiceError, TokenService};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReminderReport {
    pub eligible: usize,
    pub sent_to: Vec<String>,
    pub failed: Vec<String>,
}

impl ReminderReport {
    pub fn message(&self) -> &'static str {
        if self.eligible == 0 {
            "No patients need reminders"
        } else {
            "Emails sent"
        }
    }
}

/// Batch that sends a fresh check-in link to every patient who has gone quiet
pub struct ReminderService {
    tokens: TokenService,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    config: Arc<AppConfig>,
}

impl ReminderService {
    pub fn new(
        tokens: TokenService,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            tokens,
            store,
            notifier,
            config,
        }
    }

    /// Patients who have not answered within the inactivity window and hold no unused
    /// token each get a new token and an email. One patient's failure never stops the batch.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<ReminderReport, ServiceError> {
        let days = self.config.reminders.inactivity_days;
        let inactive_since = Duration::try_days(days)
            .filter(|window| *window > Duration::zero())
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| ServiceError::Misconfigured(format!("invalid reminder inactivity window: {days} days")))?;
        let candidates = self.store.reminder_candidates(inactive_since).await?;

        let mut report = ReminderReport {
            eligible: candidates.len(),
            ..Default::default()
        };
        info!("Reminder batch: {} patient(s) eligible", report.eligible);

        for patient in candidates {
            match self.remind(&patient).await {
                Ok(()) => report.sent_to.push(patient.email),
                Err(e) => {
                    warn!("Reminder for patient {} failed: {}", patient.id, e);
                    report.failed.push(patient.email);
                }
            }
        }

        if !report.failed.is_empty() {
            error!("Reminder batch finished with {} failure(s)", report.failed.len());
        }
        info!("Reminder batch sent {} email(s)", report.sent_to.len());
        Ok(report)
    }

    async fn remind(&self, patient: &Patient) -> Result<(), ServiceError> {
        let token = self.tokens.issue(patient.id).await?;
        let content = templates::reminder(&patient.name, &self.config.form_url(&token.token));

        self.notifier
            .send(OutgoingEmail {
                to: patient.email.clone(),
                to_name: Some(patient.name.clone()),
                reply_to: None,
                subject: content.subject,
                text_body: content.text,
                html_body: content.html,
                attachment: None,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewPatient;
    use crate::testing::TestContext;

    async fn patient_answered(ctx: &TestContext, email: &str, at: DateTime<Utc>) -> Patient {
        ctx.store
            .insert_patient(NewPatient {
                name: email.to_string(),
                email: email.to_string(),
                phone: None,
                last_response_date: Some(at),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reminds_quiet_patients_without_open_tokens() {
        let ctx = TestContext::new();
        let now = Utc::now();
        let stale = now - Duration::days(10);

        patient_answered(&ctx, "a@example.com", stale).await;
        ctx.patient("B", "b@example.com").await;
        let holder = patient_answered(&ctx, "c@example.com", stale).await;
        let open = ctx.state.tokens().issue(holder.id).await.unwrap();
        patient_answered(&ctx, "recent@example.com", now - Duration::days(2)).await;
        ctx.notifier.fail_for("b@example.com");

        let report = ctx.state.reminders().run(now).await.unwrap();

        assert_eq!(report.eligible, 2);
        assert_eq!(report.sent_to, vec!["a@example.com".to_string()]);
        assert_eq!(report.failed, vec!["b@example.com".to_string()]);
        assert_eq!(report.message(), "Emails sent");

        // Both reminded patients now hold an unused token; the holder kept its original one
        let rerun = ctx.state.reminders().run(now).await.unwrap();
        assert_eq!(rerun.eligible, 0);
        assert!(!ctx.store.find_token(&open.token).await.unwrap().unwrap().used);
        assert!(ctx.notifier.sent_to("c@example.com").is_empty());
    }

    #[tokio::test]
    async fn reminder_links_to_form() {
        let ctx = TestContext::new();
        ctx.patient("Sarah Johnson", "sarah@example.com").await;

        ctx.state.reminders().run(Utc::now()).await.unwrap();

        let sent = ctx.notifier.sent_to("sarah@example.com");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Hi Sarah Johnson, How Are You Feeling?");
        assert!(sent[0].text_body.contains("https://crm.test/form/"));
    }

    #[tokio::test]
    async fn nothing_to_do() {
        let ctx = TestContext::new();
        let report = ctx.state.reminders().run(Utc::now()).await.unwrap();
        assert_eq!(report.eligible, 0);
        assert!(report.sent_to.is_empty());
        assert_eq!(report.message(), "No patients need reminders");
    }

    #[tokio::test]
    async fn out_of_range_window_is_an_error() {
        for days in [9_000_000_000_000, 0, -7] {
            let ctx = TestContext::with_config(|config| config.reminders.inactivity_days = days);
            ctx.patient("Sarah Johnson", "sarah@example.com").await;

            let err = ctx.state.reminders().run(Utc::now()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Misconfigured(_)), "{days} days");
            assert!(ctx.notifier.sent_to("sarah@example.com").is_empty());
        }
    }

    #[tokio::test]
    async fn eligibility_failure_aborts_batch() {
        let ctx = TestContext::new();
        ctx.patient("Sarah Johnson", "sarah@example.com").await;
        ctx.patient("Tom Reed", "tom@example.com").await;
        ctx.store.fail_table("tokens");

        let err = ctx.state.reminders().run(Utc::now()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Persistence(_)));
    }
}
