use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::models::{NewPatient, Patient, PatientChanges, PatientOverview};
use crate::database::{CascadeStep, DatabaseError, Store};
use crate::services::{validation, ServiceError};

/// Body of `POST /patients`. The dashboard's original field names are accepted too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePatient {
    #[serde(alias = "newPatientName")]
    pub name: Option<String>,
    #[serde(alias = "newPatientEmail")]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(alias = "date")]
    pub last_response_date: Option<DateTime<Utc>>,
}

/// Body of `PATCH /patients`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatient {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub well_being_score: Option<i32>,
}

/// Patient aggregate: creation, dashboard projection, therapist edits and cascading removal
pub struct PatientService {
    store: Arc<dyn Store>,
}

impl PatientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreatePatient) -> Result<Uuid, ServiceError> {
        let name = validation::required("name", request.name.as_deref())?;
        let email = validation::required("email", request.email.as_deref())?;
        validation::email(&email)?;
        let phone = match request.phone {
            Some(phone) => Some(validation::required("phone", Some(&phone))?),
            None => None,
        };

        if self.store.find_patient_by_email(&email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        let patient = self
            .store
            .insert_patient(NewPatient {
                name,
                email,
                phone,
                last_response_date: request.last_response_date,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent create for the same address
                DatabaseError::UniqueViolation(_) => ServiceError::DuplicateEmail,
                other => ServiceError::Persistence(other),
            })?;

        info!("Created patient {}", patient.id);
        Ok(patient.id)
    }

    /// Every patient (or just `id`) with only its newest note attached
    pub async fn overviews(&self, id: Option<Uuid>) -> Result<Vec<PatientOverview>, ServiceError> {
        Ok(self.store.patient_overviews(id).await?)
    }

    pub async fn update(&self, id: Uuid, request: UpdatePatient) -> Result<Patient, ServiceError> {
        let name = match request.name {
            Some(name) => Some(validation::required("name", Some(&name))?),
            None => None,
        };
        let phone = match request.phone {
            Some(phone) => Some(validation::required("phone", Some(&phone))?),
            None => None,
        };
        if let Some(score) = request.well_being_score {
            validation::well_being_score(score)?;
        }

        let changes = PatientChanges {
            name,
            phone,
            well_being_score: request.well_being_score,
        };

        let patient = self
            .store
            .update_patient(id, changes)
            .await?
            .ok_or(ServiceError::PatientNotFound)?;

        info!("Updated patient {}", id);
        Ok(patient)
    }

    /// Remove the patient's submissions, notes, sessions and tokens, then the patient.
    /// Stops at the first failing collection; the patient row is only removed once
    /// every dependent collection is gone.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        for step in CascadeStep::ORDER {
            match self.store.delete_for_patient(step, id).await {
                Ok(removed) => info!("Deleted {} row(s) from {} for patient {}", removed, step, id),
                Err(source) => {
                    error!("Error deleting {} for patient {}: {}", step, id, source);
                    return Err(ServiceError::CascadeFailed { step, source });
                }
            }
        }
        Ok(())
    }
}
