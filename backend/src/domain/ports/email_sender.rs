//! Outbound port for transactional email.

use async_trait::async_trait;

use crate::domain::EmailMessage;

use super::define_port_error;

define_port_error! {
    /// Errors raised by email adapters.
    pub enum EmailSenderError {
        /// The provider could not be reached.
        Transport { message: String } => "email transport failed: {message}",
        /// The provider refused the message.
        Rejected { status: u16, message: String } => "email rejected with status {status}: {message}",
    }
}

/// Driven port delivering transactional email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailSenderError>;
}
