//! Email sender used when no provider is configured.

use async_trait::async_trait;
use tracing::info;

use crate::domain::EmailMessage;
use crate::domain::ports::{EmailSender, EmailSenderError};

/// Logs each message at `info` instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailSenderError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            bytes = message.html.len(),
            "email delivery disabled; message logged only"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeds() {
        let message = EmailMessage {
            to: "a@example.test".to_owned(),
            subject: "s".to_owned(),
            html: String::new(),
        };
        LoggingEmailSender.send(&message).await.expect("logged");
    }
}
