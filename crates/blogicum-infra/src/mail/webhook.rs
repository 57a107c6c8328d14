use async_trait::async_trait;

use blogicum_core::ports::{Email, MailError, Mailer};

/// Posts each message as JSON to an HTTP mail relay.
pub struct WebhookMailer {
    url: String,
    client: reqwest::Client,
}

impl WebhookMailer {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        let payload = serde_json::json!({
            "from": email.from,
            "to": email.to,
            "subject": email.subject,
            "text": email.body,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected(format!("relay answered {status}")));
        }

        tracing::debug!(to = %email.to, "Email handed to relay");
        Ok(())
    }
}
