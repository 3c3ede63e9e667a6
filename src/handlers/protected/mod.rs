// handlers/protected/mod.rs - Dashboard handlers (JWT authentication required)
//
// Mounted behind `jwt_auth_middleware`; every handler can assume an `AuthUser`
// extension is present.
pub mod notes;
pub mod patients;
pub mod reminders;
pub mod responses;
pub mod sessions;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `?id=` selector shared by the patient-scoped routes
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

impl IdQuery {
    /// Absent is fine, malformed is not
    pub fn optional(&self) -> Result<Option<Uuid>, ApiError> {
        match self.id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| ApiError::bad_request(format!("Invalid patient ID: {raw}"))),
        }
    }

    pub fn required(&self) -> Result<Uuid, ApiError> {
        self.optional()?
            .ok_or_else(|| ApiError::bad_request("Patient ID is required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(id: Option<&str>) -> IdQuery {
        IdQuery { id: id.map(str::to_string) }
    }

    #[test]
    fn parses_present_id() {
        let id = Uuid::new_v4();
        assert_eq!(query(Some(&id.to_string())).required().unwrap(), id);
    }

    #[test]
    fn missing_id_is_only_an_error_when_required() {
        assert!(query(None).optional().unwrap().is_none());
        assert!(query(Some("")).required().is_err());
    }

    #[test]
    fn malformed_id_is_rejected() {
        assert_eq!(query(Some("42")).optional().unwrap_err().status_code(), 400);
    }
}
