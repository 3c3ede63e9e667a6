// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Patients never log in. The form token in the URL is their only credential, and it is
// checked by the redemption service, not by middleware.
pub mod form;

pub use form::{get as form_get, submit as form_submit};
