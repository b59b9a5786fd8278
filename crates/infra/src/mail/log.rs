use tracing::info;

use super::{MailError, MailMessage, Mailer};

/// Mailer that only logs what it would have sent.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body_len = message.text.len(),
            "mail not delivered (log transport)"
        );
        Ok(())
    }
}
