use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::{MailError, MailMessage, Mailer};

/// Delivers mail by POSTing the message as JSON to an HTTP relay.
#[derive(Debug, Clone)]
pub struct HttpMailRelay {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpMailRelay {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, MailError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(MailError::InvalidConfig(format!(
                "relay url must be http(s): {url}"
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| MailError::InvalidConfig(e.to_string()))?;
        Ok(Self { client, url, token })
    }
}

#[async_trait::async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let mut request = self.client.post(&self.url).json(message);
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(to = %message.to, status = status.as_u16(), "mail accepted by relay");
        Ok(())
    }
}
