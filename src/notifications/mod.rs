//! Outbound email: the [`Notifier`] port, its lettre-backed implementation, message
//! templates and the calendar attachment writer.

pub mod calendar;
pub mod email;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use calendar::CalendarEvent;
pub use email::EmailService;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Email delivery is not configured")]
    NotConfigured,

    #[error("Invalid email address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Transport(String),
}

/// File attached to an outgoing email (calendar invites)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: String,
    pub mime_type: String,
}

/// A rendered message ready to hand to a [`Notifier`]. The sender is fixed by the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    pub attachment: Option<Attachment>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotificationError>;

    /// Address used as sender and as calendar organizer
    fn sender(&self) -> (&str, &str);
}
