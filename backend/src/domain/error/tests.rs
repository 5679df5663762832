//! Tests for domain error construction and serialisation.

use super::*;
use crate::domain::TraceId;
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
#[case(Error::not_found("missing"), ErrorCode::NotFound)]
#[case(Error::conflict("taken", "email"), ErrorCode::Conflict)]
#[case(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
#[case(Error::partial_write("half"), ErrorCode::PartialWrite)]
#[case(Error::internal("boom"), ErrorCode::InternalError)]
fn constructors_set_code(#[case] error: Error, #[case] expected: ErrorCode) {
    assert_eq!(error.code(), expected);
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values() {
    let result = Error::invalid_request("bad").try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = trace_id.instrument(async move { Error::internal("boom") }).await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
fn conflict_serialises_with_error_and_field_keys() {
    let error = Error::conflict("email already registered", "email");
    let value = serde_json::to_value(&error).expect("serialise error");

    assert_eq!(value["error"], "conflict");
    assert_eq!(value["field"], "email");
    assert_eq!(value["message"], "email already registered");
    assert!(value.get("trace_id").is_none());
    assert!(value.get("details").is_none());
}

#[rstest]
fn deserialisation_round_trips_optional_parts(expected_trace_id: String) {
    let payload = json!({
        "error": "partial_write",
        "message": "half written",
        "trace_id": expected_trace_id,
        "details": { "user_id": "3" }
    });

    let error: Error = serde_json::from_value(payload).expect("valid payload");

    assert_eq!(error.code(), ErrorCode::PartialWrite);
    assert_eq!(error.trace_id(), Some(TRACE_ID));
    assert_eq!(error.details(), Some(&json!({ "user_id": "3" })));
    assert!(error.field().is_none());
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let payload = json!({ "error": "not_found", "message": "  " });
    let result: Result<Error, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}
