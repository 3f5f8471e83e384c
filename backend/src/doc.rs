//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every handler in the inbound HTTP layer together with
//! the DTO and error schemas. Swagger UI serves it at `/docs` in debug builds.

use crate::inbound::http::deposits::{CreateDepositRequest, UpdateDepositRequest};
use crate::inbound::http::dto::{
    CustomerDto, DepositDetailDto, DepositDto, DepositEnvelope, LineItemDto, NotificationDto,
    PickupDto, SelectionDto, VehicleDto,
};
use crate::inbound::http::identity::USER_ID_HEADER;
use crate::inbound::http::payment::{PaymentQuoteResponse, PaymentRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Document the caller identity header set by the upstream auth proxy.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "CallerHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                USER_ID_HEADER,
                "Numeric user id injected by the authentication proxy.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Showroom API",
        description = "Vehicle catalogue, deposits, card payments and in-app notifications."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("CallerHeader" = [])),
    paths(
        crate::inbound::http::payment::submit_payment,
        crate::inbound::http::deposits::create_deposit,
        crate::inbound::http::deposits::list_deposits,
        crate::inbound::http::deposits::get_deposit,
        crate::inbound::http::deposits::update_deposit,
        crate::inbound::http::deposits::cancel_deposit,
        crate::inbound::http::vehicles::list_vehicles,
        crate::inbound::http::vehicles::get_vehicle,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_notification_read,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        PaymentRequest,
        PaymentQuoteResponse,
        CreateDepositRequest,
        UpdateDepositRequest,
        SelectionDto,
        VehicleDto,
        CustomerDto,
        DepositDto,
        LineItemDto,
        PickupDto,
        DepositDetailDto,
        DepositEnvelope,
        NotificationDto,
    )),
    tags(
        (name = "payments", description = "Card quotes, confirmations and cash deposits"),
        (name = "deposits", description = "Deposit lifecycle"),
        (name = "vehicles", description = "Public catalogue"),
        (name = "notifications", description = "In-app notifications for the caller"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
