//! Outgoing mail port.

use async_trait::async_trait;

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers messages to users (welcome mail, password reset links).
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail rejected: {0}")]
    Rejected(String),
}
