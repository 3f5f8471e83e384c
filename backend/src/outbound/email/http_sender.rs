//! JSON-over-HTTP transactional email adapter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use crate::domain::EmailMessage;
use crate::domain::ports::{EmailSender, EmailSenderError};

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Posts messages to a provider endpoint such as Resend's `/emails`.
pub struct HttpEmailSender {
    client: Client,
    endpoint: Url,
    api_key: String,
    from: String,
}

impl HttpEmailSender {
    /// Build a sender that authenticates with `api_key` as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            from: from.into(),
        })
    }

    fn payload<'a>(&'a self, message: &'a EmailMessage) -> OutgoingEmail<'a> {
        OutgoingEmail {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailSenderError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&self.payload(message))
            .send()
            .await
            .map_err(|err| EmailSenderError::transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(EmailSenderError::rejected(
            status.as_u16(),
            body.chars().take(160).collect::<String>(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_wraps_the_single_recipient() {
        let sender = HttpEmailSender::new(
            Url::parse("https://mail.example.test/emails").expect("url"),
            "key",
            "Showroom <no-reply@showroom.test>",
            Duration::from_secs(5),
        )
        .expect("client");
        let message = EmailMessage {
            to: "lan@example.test".to_owned(),
            subject: "Xác nhận đặt cọc #3".to_owned(),
            html: "<p>ok</p>".to_owned(),
        };

        let json = serde_json::to_value(sender.payload(&message)).expect("serialises");

        assert_eq!(
            json,
            serde_json::json!({
                "from": "Showroom <no-reply@showroom.test>",
                "to": ["lan@example.test"],
                "subject": "Xác nhận đặt cọc #3",
                "html": "<p>ok</p>",
            })
        );
    }
}
