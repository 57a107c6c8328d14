use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use blogicum_core::ports::{Email, MailError, Mailer};

/// Keeps sent messages in an outbox that tests can inspect.
#[derive(Clone, Default)]
pub struct InMemoryMailer {
    outbox: Arc<RwLock<Vec<Email>>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    pub async fn sent(&self) -> Vec<Email> {
        self.outbox.read().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        self.outbox.write().await.push(email);
        Ok(())
    }
}
