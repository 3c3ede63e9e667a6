pub mod note;
pub mod patient;
pub mod session;
pub mod submission;
pub mod token;

pub use note::PatientNote;
pub use patient::{NewPatient, Patient, PatientChanges, PatientOverview};
pub use session::Session;
pub use submission::{FormSubmission, NewSubmission, ResponseData};
pub use token::Token;
