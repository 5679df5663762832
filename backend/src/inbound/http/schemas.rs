//! OpenAPI schema definitions for the error envelope.
//!
//! The domain [`crate::domain::Error`] serialises through a DTO that renames
//! `code` to `error`. These wrappers document the wire shape that clients
//! actually receive.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The requested user or picture does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// First name, email or phone is already registered.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store could not be reached after bounded retries.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// A registration left stores inconsistent and compensation failed.
    #[schema(rename = "partial_write")]
    PartialWrite,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for the JSON error body.
#[derive(ToSchema)]
#[schema(as = ApiError)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "conflict")]
    error: ErrorCodeSchema,
    /// Human-readable message.
    #[schema(example = "email is already registered")]
    message: String,
    /// Offending form field, when one applies.
    #[schema(example = "email")]
    field: Option<String>,
    /// Correlation identifier, also sent in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Structured context, e.g. `user_id` for a partial write.
    details: Option<serde_json::Value>,
}
