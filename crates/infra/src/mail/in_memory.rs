use std::collections::HashSet;
use std::sync::Mutex;

use super::{MailError, MailMessage, Mailer};

/// Records sent messages; can be told to fail for given recipients.
#[derive(Debug, Default)]
pub struct InMemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
    failing: Mutex<HashSet<String>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: impl Into<String>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(recipient.into());
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let refused = self
            .failing
            .lock()
            .map(|f| f.contains(&message.to))
            .unwrap_or(false);
        if refused {
            return Err(MailError::Transport(format!(
                "recipient {} refused",
                message.to
            )));
        }
        self.sent
            .lock()
            .map_err(|_| MailError::Transport("mailbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}
