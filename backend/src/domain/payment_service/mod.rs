//! Card payment flow: quoting with a gateway intent, then confirmation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use super::deposit_service::{map_pricing_error, map_user_error, price_selection};
use super::ports::{
    CardSettlement, ConfirmRequest, DepositCommand, DepositPlacement, IntentRequest, IntentStatus,
    PaymentCommand, PaymentGateway, PaymentGatewayError, PaymentQuote, PlaceDepositRequest,
    QuoteRequest, RetrievedIntent, UserDirectory, VehicleRepository,
};
use super::{
    DepositIntentMetadata, Error, GatewayPricing, PaymentMethod, User, UserId, VehicleSelection,
};

/// Ports the payment service drives.
#[derive(Clone)]
pub struct PaymentServicePorts {
    /// Card gateway holding the intents.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Catalogue used for quoting.
    pub vehicles: Arc<dyn VehicleRepository>,
    /// Caller lookup.
    pub users: Arc<dyn UserDirectory>,
    /// Orchestrator that records confirmed deposits.
    pub deposits: Arc<dyn DepositCommand>,
}

/// [`PaymentCommand`] backed by a payment gateway and the deposit
/// orchestrator.
#[derive(Clone)]
pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    vehicles: Arc<dyn VehicleRepository>,
    users: Arc<dyn UserDirectory>,
    deposits: Arc<dyn DepositCommand>,
    pricing: GatewayPricing,
}

impl PaymentService {
    /// Create the service.
    pub fn new(ports: PaymentServicePorts, pricing: GatewayPricing) -> Self {
        Self {
            gateway: ports.gateway,
            vehicles: ports.vehicles,
            users: ports.users,
            deposits: ports.deposits,
            pricing,
        }
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized(format!("unknown user {id}")))
    }

    /// Reconcile the charged amount with the deposit the intent was quoted
    /// for. A capped charge settles for the converted cap.
    fn settle(
        &self,
        metadata: &DepositIntentMetadata,
        intent: &RetrievedIntent,
    ) -> Result<CardSettlement, Error> {
        let deposit_amount = metadata
            .percentage
            .share_of(metadata.total_amount)
            .map_err(map_pricing_error)?;
        let charge = self
            .pricing
            .charge_for(deposit_amount)
            .map_err(map_pricing_error)?;
        if charge.submitted_amount != intent.amount {
            return Err(Error::conflict(format!(
                "payment {} charged a different amount than was quoted",
                intent.id
            ))
            .with_details(json!({
                "charged": intent.amount,
                "expected": charge.submitted_amount,
                "currency": charge.currency,
            })));
        }
        let collected = if charge.capped {
            self.pricing
                .catalogue_amount(intent.amount)
                .map_err(map_pricing_error)?
                .min(deposit_amount)
        } else {
            deposit_amount
        };
        Ok(CardSettlement {
            quoted_total: metadata.total_amount,
            collected,
        })
    }
}

#[async_trait]
impl PaymentCommand for PaymentService {
    async fn quote(&self, request: QuoteRequest) -> Result<PaymentQuote, Error> {
        self.require_user(request.customer_id).await?;
        let quote = price_selection(
            self.vehicles.as_ref(),
            &request.selections,
            request.percentage,
        )
        .await?;
        if let Some(taken) = quote
            .items
            .iter()
            .find(|item| !item.vehicle.status.is_reservable())
        {
            return Err(Error::conflict(format!(
                "vehicle {} is already reserved",
                taken.vehicle.name
            ))
            .with_details(json!({
                "vehicleId": taken.vehicle.id.get(),
                "name": taken.vehicle.name,
            })));
        }

        let charge = self
            .pricing
            .charge_for(quote.deposit_amount)
            .map_err(map_pricing_error)?;
        let metadata = DepositIntentMetadata {
            customer_id: request.customer_id,
            selections: quote
                .items
                .iter()
                .map(|item| VehicleSelection {
                    vehicle_id: item.vehicle.id,
                    quantity: item.quantity,
                })
                .collect(),
            total_amount: quote.total_price,
            percentage: quote.percentage,
        };
        let encoded = metadata.to_metadata().map_err(|err| {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "vehicles": quote.items.len() }))
        })?;
        let intent = self
            .gateway
            .create_intent(&IntentRequest {
                amount: charge.submitted_amount,
                currency: charge.currency.clone(),
                metadata: encoded,
            })
            .await
            .map_err(map_gateway_error)?;

        if charge.capped {
            warn!(
                intent_id = %intent.id,
                requested = charge.requested_amount,
                submitted = charge.submitted_amount,
                "gateway amount capped below the quoted deposit"
            );
        }
        info!(
            intent_id = %intent.id,
            customer_id = %request.customer_id,
            deposit_amount = quote.deposit_amount,
            gateway_amount = charge.submitted_amount,
            "payment intent opened"
        );

        Ok(PaymentQuote {
            client_secret: intent.client_secret,
            intent_id: intent.id,
            deposit_amount: quote.deposit_amount,
            total_amount: quote.total_price,
            percentage: quote.percentage,
            gateway_amount: charge.submitted_amount,
            currency: charge.currency,
            capped: charge.capped,
        })
    }

    async fn confirm(&self, request: ConfirmRequest) -> Result<DepositPlacement, Error> {
        let caller = self.require_user(request.caller).await?;
        let intent = self
            .gateway
            .retrieve_intent(&request.intent_id)
            .await
            .map_err(map_gateway_error)?;
        if intent.status != IntentStatus::Succeeded {
            return Err(Error::invalid_request(format!(
                "payment {} has not succeeded",
                intent.id
            ))
            .with_details(json!({ "status": intent.status.as_str() })));
        }

        let metadata = DepositIntentMetadata::from_metadata(&intent.metadata)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if metadata.customer_id != caller.id && !caller.role.is_back_office() {
            return Err(Error::forbidden(
                "payment belongs to a different customer",
            ));
        }

        let settlement = self.settle(&metadata, &intent)?;
        self.deposits
            .place(PlaceDepositRequest {
                customer_id: metadata.customer_id,
                selections: metadata.selections,
                percentage: metadata.percentage,
                method: PaymentMethod::Card,
                gateway_reference: Some(intent.id),
                pickup: request.pickup,
                settlement: Some(settlement),
            })
            .await
    }
}

fn map_gateway_error(err: PaymentGatewayError) -> Error {
    match err {
        PaymentGatewayError::Unavailable { message } => Error::service_unavailable(message),
        PaymentGatewayError::NotFound { intent_id } => {
            Error::not_found(format!("payment {intent_id} not found"))
        }
        PaymentGatewayError::Rejected { status, message } => {
            Error::upstream_failure("payment gateway rejected the request")
                .with_details(json!({ "status": status, "message": message }))
        }
        PaymentGatewayError::Decode { message } => {
            Error::upstream_failure("payment gateway returned an unreadable response")
                .with_details(json!({ "message": message }))
        }
    }
}
