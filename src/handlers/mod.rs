// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth): the patient-facing check-in form, reached through a single-use token.
// Protected (JWT auth): the therapist dashboard API.
pub mod protected;
pub mod public;
