//! Outbound mail.
//!
//! Delivery is best effort: callers log failures and carry on. Transports:
//! - `LogMailer`: writes messages to the log (default)
//! - `HttpMailRelay`: POSTs JSON to an HTTP relay
//! - `InMemoryMailer`: records messages for tests

use serde::Serialize;
use thiserror::Error;

pub mod http_relay;
pub mod in_memory;
pub mod log;
pub mod notifier;

pub use http_relay::HttpMailRelay;
pub use in_memory::InMemoryMailer;
pub use log::LogMailer;
pub use notifier::{FailedDelivery, NotificationReport, SupplierNotifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid mail configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}
