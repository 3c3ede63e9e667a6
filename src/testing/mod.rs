//! Fixtures for unit tests: an in-memory application state and a notifier that
//! records what it was asked to send.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::database::models::{NewPatient, Patient};
use crate::database::{MemoryStore, Store};
use crate::notifications::{NotificationError, Notifier, OutgoingEmail};
use crate::state::AppState;

/// Notifier that keeps sent messages in memory and fails for chosen recipients
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent().into_iter().filter(|e| e.to == address).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError> {
        if self.failing.lock().unwrap().contains(&email.to) {
            return Err(NotificationError::Transport(format!("relay rejected {}", email.to)));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }

    fn sender(&self) -> (&str, &str) {
        ("CRM Therapy", "crm@test.local")
    }
}

/// Memory-backed state plus direct handles to its fakes
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::development();
        config.api.public_base_url = "https://crm.test".to_string();
        config.email.therapist_email = "therapist@test.local".to_string();
        adjust(&mut config);

        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(config, store.clone(), notifier.clone());

        Self { state, store, notifier }
    }

    /// Insert a patient directly, bypassing validation
    pub async fn patient(&self, name: &str, email: &str) -> Patient {
        self.store
            .insert_patient(NewPatient {
                name: name.to_string(),
                email: email.to_string(),
                phone: None,
                last_response_date: None,
            })
            .await
            .expect("insert test patient")
    }
}
