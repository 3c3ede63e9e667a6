use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, Store};
use crate::notifications::{EmailService, Notifier};
use crate::services::{PatientService, RecordsService, RedemptionService, ReminderService, TokenService};

/// Process-wide handles, built once at startup and shared with every request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            notifier,
        }
    }

    /// Open the configured store and mail relay
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store = DatabaseManager::open(&config.database).await?;
        let notifier: Arc<dyn Notifier> = Arc::new(EmailService::new(&config.email)?);
        Ok(Self::new(config, store, notifier))
    }

    pub fn patients(&self) -> PatientService {
        PatientService::new(self.store.clone())
    }

    pub fn tokens(&self) -> TokenService {
        TokenService::new(self.store.clone())
    }

    pub fn redemptions(&self) -> RedemptionService {
        RedemptionService::new(self.store.clone(), self.notifier.clone(), self.config.clone())
    }

    pub fn records(&self) -> RecordsService {
        RecordsService::new(self.store.clone(), self.notifier.clone())
    }

    pub fn reminders(&self) -> ReminderService {
        ReminderService::new(self.tokens(), self.store.clone(), self.notifier.clone(), self.config.clone())
    }
}
