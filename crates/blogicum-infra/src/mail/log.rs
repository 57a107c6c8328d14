use async_trait::async_trait;

use blogicum_core::ports::{Email, MailError, Mailer};

/// Writes messages to the log instead of delivering them (development).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "Outgoing email"
        );
        Ok(())
    }
}
