//! Payment endpoint: quote a card deposit, confirm it, or pay in cash.
//!
//! ```text
//! POST /api/v1/payment
//! ```
//!
//! Without `stripeSessionId` the handler quotes the deposit and opens a
//! gateway intent, unless `paymentMethod` is `cash`, in which case the deposit
//! is placed immediately. With `stripeSessionId` the succeeded intent is
//! turned into a deposit; repeating the call replays the first result.

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{ConfirmRequest, PaymentQuote, PlaceDepositRequest, QuoteRequest};
use crate::domain::{Error, GatewayIntentId, PaymentMethod};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::no_store_header;
use crate::inbound::http::dto::{
    DepositEnvelope, SelectionDto, parse_percentage, parse_pickup, parse_selections,
};
use crate::inbound::http::identity::Caller;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Payment request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Vehicles to reserve.
    #[serde(default)]
    pub vehicles: Vec<SelectionDto>,
    /// One of 10, 20, 30, 40, 50 or 100; defaults to 100.
    #[schema(example = 20)]
    pub deposit_percentage: Option<i64>,
    /// Gateway intent id returned by a previous quote.
    #[schema(example = "pi_3Nf0")]
    pub stripe_session_id: Option<String>,
    /// `card` (default) or `cash`.
    #[schema(example = "card")]
    pub payment_method: Option<String>,
    /// Proposed pickup time.
    pub pickup_at: Option<DateTime<Utc>>,
    /// Proposed pickup location.
    pub pickup_location: Option<String>,
}

/// Quote returned before the customer pays by card.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuoteResponse {
    /// Secret the storefront uses to complete the card payment.
    pub client_secret: String,
    /// Deposit in VND.
    #[schema(example = 200_000_000)]
    pub deposit_amount: i64,
    /// Full price in VND.
    #[schema(example = 1_000_000_000)]
    pub total_amount: i64,
    /// Applied percentage.
    #[schema(example = 20)]
    pub deposit_percentage: u8,
    /// True when the gateway charge was capped below the deposit.
    pub capped_amount: bool,
    /// Amount submitted to the gateway in its smallest unit.
    #[schema(example = 800_000)]
    pub gateway_amount: i64,
    /// Gateway settlement currency.
    #[schema(example = "usd")]
    pub currency: String,
}

impl From<PaymentQuote> for PaymentQuoteResponse {
    fn from(quote: PaymentQuote) -> Self {
        Self {
            client_secret: quote.client_secret,
            deposit_amount: quote.deposit_amount,
            total_amount: quote.total_amount,
            deposit_percentage: quote.percentage.get(),
            capped_amount: quote.capped,
            gateway_amount: quote.gateway_amount,
            currency: quote.currency,
        }
    }
}

fn parse_method(raw: Option<&str>) -> Result<PaymentMethod, Error> {
    match raw {
        None => Ok(PaymentMethod::Card),
        Some(value) => value.parse().map_err(|_| {
            Error::invalid_request(format!("unsupported payment method: {value}"))
                .with_details(json!({ "field": "paymentMethod", "allowed": ["card", "cash"] }))
        }),
    }
}

fn parse_intent_id(raw: &str) -> Result<GatewayIntentId, Error> {
    GatewayIntentId::new(raw).map_err(|_| {
        Error::invalid_request("stripeSessionId must not be empty")
            .with_details(json!({ "field": "stripeSessionId" }))
    })
}

/// Quote, confirm or pay a vehicle deposit.
#[utoipa::path(
    post,
    path = "/api/v1/payment",
    request_body = PaymentRequest,
    params(("X-User-Id" = i64, Header, description = "Authenticated caller")),
    responses(
        (status = 200, description = "Quote, or confirmation replay", body = PaymentQuoteResponse),
        (status = 201, description = "Deposit placed", body = DepositEnvelope),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Payment belongs to another customer", body = ErrorSchema),
        (status = 404, description = "Vehicle or intent not found", body = ErrorSchema),
        (status = 409, description = "Vehicle already reserved", body = ErrorSchema),
        (status = 502, description = "Gateway failure", body = ErrorSchema),
        (status = 503, description = "Gateway not configured", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "submitPayment"
)]
#[post("/payment")]
pub async fn submit_payment(
    state: web::Data<HttpState>,
    caller: Caller,
    payload: web::Json<PaymentRequest>,
) -> ApiResult<HttpResponse> {
    let caller_id = caller.require()?;
    let request = payload.into_inner();
    let pickup = parse_pickup(request.pickup_at, request.pickup_location);

    if let Some(raw) = request.stripe_session_id.as_deref() {
        let placement = state
            .payments
            .confirm(ConfirmRequest {
                caller: caller_id,
                intent_id: parse_intent_id(raw)?,
                pickup,
            })
            .await?;
        let response = if placement.is_replay() {
            HttpResponse::Ok()
        } else {
            HttpResponse::Created()
        }
        .json(DepositEnvelope::from(placement));
        return Ok(response);
    }

    let selections = parse_selections(&request.vehicles)?;
    let percentage = parse_percentage(request.deposit_percentage)?;
    match parse_method(request.payment_method.as_deref())? {
        PaymentMethod::Cash => {
            let placement = state
                .deposits
                .place(PlaceDepositRequest {
                    customer_id: caller_id,
                    selections,
                    percentage,
                    method: PaymentMethod::Cash,
                    gateway_reference: None,
                    pickup,
                    settlement: None,
                })
                .await?;
            Ok(HttpResponse::Created().json(DepositEnvelope::from(placement)))
        }
        PaymentMethod::Card => {
            let quote = state
                .payments
                .quote(QuoteRequest {
                    customer_id: caller_id,
                    selections,
                    percentage,
                })
                .await?;
            Ok(HttpResponse::Ok()
                .insert_header(no_store_header())
                .json(PaymentQuoteResponse::from(quote)))
        }
    }
}
