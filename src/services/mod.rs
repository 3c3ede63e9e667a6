//! Domain operations. Handlers stay thin and delegate here; every service talks to
//! the outside world only through the [`Store`](crate::database::Store) and
//! [`Notifier`](crate::notifications::Notifier) ports.

pub mod patient_service;
pub mod records_service;
pub mod redemption_service;
pub mod reminder_service;
pub mod token_service;
pub mod validation;

use thiserror::Error;

use crate::database::{CascadeStep, DatabaseError};
use crate::notifications::NotificationError;

pub use patient_service::{CreatePatient, PatientService, UpdatePatient};
pub use records_service::{RecordsService, ScheduledSession};
pub use redemption_service::{RedemptionOutcome, RedemptionRequest, RedemptionService};
pub use reminder_service::{ReminderReport, ReminderService};
pub use token_service::{FormContext, TokenService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Patient with this email already exists")]
    DuplicateEmail,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has already been used")]
    TokenAlreadyUsed,

    #[error("{0}")]
    InvalidPayload(String),

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Failed to delete {step}: {source}")]
    CascadeFailed {
        step: CascadeStep,
        #[source]
        source: DatabaseError,
    },

    #[error("{0}")]
    Misconfigured(String),

    #[error(transparent)]
    Persistence(#[from] DatabaseError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}
