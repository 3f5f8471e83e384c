//! Wire shapes for the Stripe payment intents API.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::GatewayIntentId;
use crate::domain::ports::{CreatedIntent, IntentStatus, RetrievedIntent};

#[derive(Debug, Deserialize)]
pub(super) struct PaymentIntentDto {
    pub(super) id: String,
    #[serde(default)]
    pub(super) client_secret: Option<String>,
    pub(super) status: String,
    pub(super) amount: i64,
    #[serde(default)]
    pub(super) metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelopeDto {
    pub(super) error: ErrorBodyDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBodyDto {
    #[serde(default)]
    pub(super) message: Option<String>,
    #[serde(default)]
    pub(super) code: Option<String>,
}

impl PaymentIntentDto {
    fn intent_id(&self) -> Result<GatewayIntentId, String> {
        GatewayIntentId::new(self.id.clone())
            .map_err(|err| format!("intent id {:?}: {err}", self.id))
    }

    pub(super) fn into_created(self) -> Result<CreatedIntent, String> {
        let id = self.intent_id()?;
        let client_secret = self
            .client_secret
            .ok_or_else(|| format!("intent {id} has no client_secret"))?;
        Ok(CreatedIntent { id, client_secret })
    }

    pub(super) fn into_retrieved(self) -> Result<RetrievedIntent, String> {
        let id = self.intent_id()?;
        Ok(RetrievedIntent {
            id,
            status: IntentStatus::from_gateway(&self.status),
            amount: self.amount,
            metadata: self.metadata,
        })
    }
}

impl ErrorEnvelopeDto {
    pub(super) fn summary(self) -> String {
        match (self.error.code, self.error.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => "unspecified gateway error".to_owned(),
        }
    }
}
