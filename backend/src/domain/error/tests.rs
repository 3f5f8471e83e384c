//! Tests for the domain error payload and its wire form.

use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn conflict_error() -> Error {
    Error::conflict("vehicle 3 is already reserved").with_details(json!({"vehicleId": 3}))
}

#[rstest]
fn constructors_set_codes() {
    assert_eq!(Error::invalid_request("x").code(), ErrorCode::InvalidRequest);
    assert_eq!(Error::not_found("x").code(), ErrorCode::NotFound);
    assert_eq!(Error::conflict("x").code(), ErrorCode::Conflict);
    assert_eq!(Error::upstream_failure("x").code(), ErrorCode::UpstreamFailure);
    assert_eq!(
        Error::service_unavailable("x").code(),
        ErrorCode::ServiceUnavailable
    );
}

#[rstest]
#[case(ErrorCode::Forbidden, "action not permitted")]
#[case(ErrorCode::NotFound, "not found")]
fn blank_messages_fall_back_to_the_code_default(
    #[case] code: ErrorCode,
    #[case] expected: &str,
) {
    assert_eq!(Error::new(code, "   ").message(), expected);
}

#[rstest]
fn blank_trace_ids_are_ignored(conflict_error: Error) {
    let traced = conflict_error.with_trace_id(TRACE_ID).with_trace_id(" ");
    assert_eq!(traced.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn display_includes_the_code() {
    assert_eq!(
        Error::conflict("vehicle 3 is already reserved").to_string(),
        "Conflict: vehicle 3 is already reserved"
    );
}

#[rstest]
fn serialises_message_under_error_key(conflict_error: Error) {
    let value = serde_json::to_value(conflict_error.with_trace_id(TRACE_ID)).expect("serialise");
    assert_eq!(
        value,
        json!({
            "error": "vehicle 3 is already reserved",
            "code": "conflict",
            "traceId": TRACE_ID,
            "details": {"vehicleId": 3}
        })
    );
}

#[rstest]
fn omits_absent_optional_fields() {
    let value = serde_json::to_value(Error::not_found("deposit 9 not found")).expect("serialise");
    assert_eq!(value, json!({"error": "deposit 9 not found", "code": "not_found"}));
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let result: Result<Error, _> =
        serde_json::from_value(json!({"error": " ", "code": "not_found"}));
    let err = result.expect_err("blank message");
    assert!(err.to_string().contains(&ErrorPayloadError::EmptyMessage.to_string()));
}

#[tokio::test]
async fn captures_trace_id_in_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("uuid");
    let error = TraceId::scope(trace_id, async { Error::internal("boom") }).await;
    assert_eq!(error.trace_id(), Some(TRACE_ID));
}
