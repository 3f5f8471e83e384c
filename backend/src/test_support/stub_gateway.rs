//! Payment gateway double that keeps intents in memory.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::GatewayIntentId;
use crate::domain::ports::{
    CreatedIntent, IntentRequest, IntentStatus, PaymentGateway, PaymentGatewayError,
    RetrievedIntent,
};

/// Opens intents locally; tests settle them with [`StubGateway::succeed`].
#[derive(Debug, Default)]
pub struct StubGateway {
    intents: Mutex<BTreeMap<String, RetrievedIntent>>,
}

impl StubGateway {
    fn intents(&self) -> MutexGuard<'_, BTreeMap<String, RetrievedIntent>> {
        self.intents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark an intent as paid.
    pub fn succeed(&self, id: &GatewayIntentId) -> bool {
        match self.intents().get_mut(id.as_str()) {
            Some(intent) => {
                intent.status = IntentStatus::Succeeded;
                true
            }
            None => false,
        }
    }

    /// Requests seen so far, oldest first.
    pub fn opened(&self) -> Vec<RetrievedIntent> {
        self.intents().values().cloned().collect()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<CreatedIntent, PaymentGatewayError> {
        let mut intents = self.intents();
        let raw = format!("pi_stub_{:04}", intents.len() + 1);
        let id = GatewayIntentId::new(raw.clone())
            .map_err(|err| PaymentGatewayError::decode(err.to_string()))?;
        intents.insert(
            raw.clone(),
            RetrievedIntent {
                id: id.clone(),
                status: IntentStatus::Pending("requires_payment_method".to_owned()),
                amount: request.amount,
                metadata: request.metadata.clone(),
            },
        );
        Ok(CreatedIntent {
            id,
            client_secret: format!("{raw}_secret"),
        })
    }

    async fn retrieve_intent(
        &self,
        id: &GatewayIntentId,
    ) -> Result<RetrievedIntent, PaymentGatewayError> {
        self.intents()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| PaymentGatewayError::not_found(id.as_str()))
    }
}
