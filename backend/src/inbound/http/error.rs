//! Rendering of domain [`Error`]s as Actix responses.
//!
//! The status is fixed per [`ErrorCode`]. The body is the serialised error,
//! `{error, message, field?, trace_id?, details?}`, except that an
//! `internal_error` body keeps only its trace id and a generic message. The
//! trace id is repeated in the `trace-id` header.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result type of the registry's HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

const INTERNAL_MESSAGE: &str = "Internal server error";

const fn http_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::PartialWrite | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// The error as the client sees it; internal causes stay in the logs.
fn client_view(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    error.trace_id().map_or_else(
        || Error::internal(INTERNAL_MESSAGE),
        |trace_id| Error::internal(INTERNAL_MESSAGE).with_trace_id(trace_id),
    )
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        http_status(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        if let Some(trace_id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, trace_id.to_owned()));
        }
        response.json(client_view(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(cause: actix_web::Error) -> Self {
        error!(error = %cause, "framework error surfaced in a handler");
        Self::internal(INTERNAL_MESSAGE)
    }
}
