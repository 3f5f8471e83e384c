//! OpenAPI schema definitions for domain types.
//!
//! Domain types do not derive `ToSchema`; the wrappers here mirror their wire
//! shape so utoipa can document them from the adapter layer.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Caller identity is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Caller may not perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with current state, such as a reserved vehicle.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency is not configured or not reachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// The payment gateway or another upstream refused the request.
    #[schema(rename = "upstream_failure")]
    UpstreamFailure,
    /// Unexpected server failure.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Human-readable message.
    #[schema(example = "vehicle VF8 is already reserved")]
    error: String,
    /// Stable machine-readable code.
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    /// Correlation identifier, echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details such as the offending vehicle.
    details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[rstest]
    #[case("invalid_request")]
    #[case("conflict")]
    #[case("upstream_failure")]
    #[case("internal_error")]
    fn error_code_schema_lists_codes(#[case] code: &str) {
        assert!(schema_to_json::<ErrorCodeSchema>().contains(code));
    }

    #[rstest]
    fn error_schema_uses_wire_field_names() {
        let json = schema_to_json::<ErrorSchema>();
        assert_eq!(ErrorSchema::name(), "domain.Error");
        assert!(json.contains("\"error\""));
        assert!(json.contains("traceId"));
    }
}
