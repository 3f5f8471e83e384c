//! Reqwest-backed Stripe payment intents adapter.
//!
//! Owns transport only: form encoding, bearer auth, status mapping and JSON
//! decoding into the gateway port's records.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::{ErrorEnvelopeDto, PaymentIntentDto};
use crate::domain::GatewayIntentId;
use crate::domain::ports::{
    CreatedIntent, IntentRequest, PaymentGateway, PaymentGatewayError, RetrievedIntent,
};

const INTENTS_PATH: &str = "v1/payment_intents";

/// Stripe gateway speaking the REST API directly.
pub struct StripeHttpGateway {
    client: Client,
    api_base: Url,
    secret_key: String,
}

impl StripeHttpGateway {
    /// Build a gateway for `api_base` (for example `https://api.stripe.com`).
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        api_base: Url,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base,
            secret_key: secret_key.into(),
        })
    }

    fn intents_url(&self, id: Option<&GatewayIntentId>) -> Result<Url, PaymentGatewayError> {
        let path = match id {
            Some(id) => format!("{INTENTS_PATH}/{id}"),
            None => INTENTS_PATH.to_owned(),
        };
        self.api_base
            .join(&path)
            .map_err(|err| PaymentGatewayError::unavailable(format!("invalid gateway url: {err}")))
    }
}

#[async_trait]
impl PaymentGateway for StripeHttpGateway {
    async fn create_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<CreatedIntent, PaymentGatewayError> {
        let response = self
            .client
            .post(self.intents_url(None)?)
            .bearer_auth(&self.secret_key)
            .form(&intent_form(request))
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        let intent = decode_intent(status, &body, None)?;
        intent.into_created().map_err(PaymentGatewayError::decode)
    }

    async fn retrieve_intent(
        &self,
        id: &GatewayIntentId,
    ) -> Result<RetrievedIntent, PaymentGatewayError> {
        let response = self
            .client
            .get(self.intents_url(Some(id))?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        let intent = decode_intent(status, &body, Some(id))?;
        intent.into_retrieved().map_err(PaymentGatewayError::decode)
    }
}

fn intent_form(request: &IntentRequest) -> Vec<(String, String)> {
    let mut form = Vec::with_capacity(request.metadata.len() + 3);
    form.push(("amount".to_owned(), request.amount.to_string()));
    form.push(("currency".to_owned(), request.currency.clone()));
    form.push((
        "automatic_payment_methods[enabled]".to_owned(),
        "true".to_owned(),
    ));
    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }
    form
}

fn decode_intent(
    status: StatusCode,
    body: &[u8],
    id: Option<&GatewayIntentId>,
) -> Result<PaymentIntentDto, PaymentGatewayError> {
    if !status.is_success() {
        return Err(map_status_error(status, body, id));
    }
    serde_json::from_slice(body).map_err(|err| {
        PaymentGatewayError::decode(format!("invalid payment intent JSON: {err}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    debug!(%error, timeout = error.is_timeout(), "gateway transport failed");
    PaymentGatewayError::unavailable(error.to_string())
}

fn map_status_error(
    status: StatusCode,
    body: &[u8],
    id: Option<&GatewayIntentId>,
) -> PaymentGatewayError {
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return PaymentGatewayError::not_found(id.as_str());
        }
    }
    let message = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .map(ErrorEnvelopeDto::summary)
        .unwrap_or_else(|_| format!("status {}", status.as_u16()));
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        PaymentGatewayError::unavailable(message)
    } else {
        PaymentGatewayError::rejected(status.as_u16(), message)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::ports::IntentStatus;
    use rstest::rstest;

    fn gateway() -> StripeHttpGateway {
        let base = Url::parse("https://api.stripe.test/").expect("valid url");
        StripeHttpGateway::new(base, "sk_test_123", Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn form_flattens_metadata_keys() {
        let request = IntentRequest {
            amount: 4_000,
            currency: "usd".to_owned(),
            metadata: BTreeMap::from([
                ("userId".to_owned(), "7".to_owned()),
                ("depositPercentage".to_owned(), "20".to_owned()),
            ]),
        };

        let form = intent_form(&request);

        assert!(form.contains(&("amount".to_owned(), "4000".to_owned())));
        assert!(form.contains(&("currency".to_owned(), "usd".to_owned())));
        assert!(form.contains(&("metadata[userId]".to_owned(), "7".to_owned())));
        assert!(form.contains(&("metadata[depositPercentage]".to_owned(), "20".to_owned())));
    }

    #[test]
    fn intent_urls_join_onto_the_api_base() {
        let gateway = gateway();
        let id = GatewayIntentId::new("pi_123").expect("valid id");

        let url = gateway.intents_url(Some(&id)).expect("url");

        assert_eq!(url.as_str(), "https://api.stripe.test/v1/payment_intents/pi_123");
    }

    #[rstest]
    #[case(StatusCode::PAYMENT_REQUIRED, "Rejected")]
    #[case(StatusCode::BAD_REQUEST, "Rejected")]
    #[case(StatusCode::TOO_MANY_REQUESTS, "Unavailable")]
    #[case(StatusCode::BAD_GATEWAY, "Unavailable")]
    #[case(StatusCode::NOT_FOUND, "NotFound")]
    fn maps_statuses(#[case] status: StatusCode, #[case] expected: &str) {
        let id = GatewayIntentId::new("pi_404").expect("valid id");
        let body = br#"{"error":{"code":"card_declined","message":"Your card was declined."}}"#;

        let error = map_status_error(status, body, Some(&id));

        let actual = match error {
            PaymentGatewayError::Rejected { ref message, .. } => {
                assert_eq!(message, "card_declined: Your card was declined.");
                "Rejected"
            }
            PaymentGatewayError::Unavailable { .. } => "Unavailable",
            PaymentGatewayError::NotFound { ref intent_id } => {
                assert_eq!(intent_id, "pi_404");
                "NotFound"
            }
            PaymentGatewayError::Decode { .. } => "Decode",
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn decodes_retrieved_intents() {
        let body = br#"{
            "id": "pi_1",
            "object": "payment_intent",
            "status": "succeeded",
            "amount": 4000,
            "client_secret": "pi_1_secret_x",
            "metadata": { "userId": "7", "totalAmount": "500000000" }
        }"#;

        let intent = decode_intent(StatusCode::OK, body, None)
            .expect("decodes")
            .into_retrieved()
            .expect("valid intent");

        assert_eq!(intent.status, IntentStatus::Succeeded);
        assert_eq!(intent.amount, 4_000);
        assert_eq!(intent.metadata.get("userId").map(String::as_str), Some("7"));
    }

    #[test]
    fn created_intents_need_a_client_secret() {
        let body = br#"{"id":"pi_2","status":"requires_payment_method","amount":10}"#;

        let err = decode_intent(StatusCode::OK, body, None)
            .expect("decodes")
            .into_created()
            .expect_err("secret missing");

        assert!(err.contains("client_secret"));
    }

    #[test]
    fn malformed_bodies_are_decode_errors() {
        let err = decode_intent(StatusCode::OK, b"<html>", None)
            .expect_err("not json");
        assert!(matches!(err, PaymentGatewayError::Decode { .. }));
    }
}
