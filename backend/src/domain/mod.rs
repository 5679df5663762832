//! Domain primitives, services, and ports.
//!
//! Purpose: Define strongly typed user and picture values, the error
//! taxonomy, and the registration and read use-cases. Storage and transport
//! live behind the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic error payload and category.
//! - TraceId: task-local request correlation identifier.
//! - User, NewUser and the validated field types.
//! - ProfilePicture, ContentType, PictureRef: picture payload and reference.
//! - RegistrationService, UsersQueryService, PictureReconciler: use-cases.
//! - StorageRetry, RetryPolicy: bounded timeout and retry for store calls.

pub mod error;
pub mod picture;
pub mod ports;
pub mod reconciliation;
pub mod registration_service;
pub mod retry;
pub mod trace_id;
pub mod user;
pub mod users_query_service;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::picture::{
    ContentType, FALLBACK_CONTENT_TYPE, PictureRef, PictureValidationError, ProfilePicture,
};
pub use self::reconciliation::{PictureReconciler, ReconciliationReport};
pub use self::registration_service::RegistrationService;
pub use self::retry::{
    BackoffJitter, Idempotency, RandomJitter, RetryPolicy, RetryRuntime, RetrySleeper,
    StorageFailure, StorageRetry, TokioSleeper, TransientError,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    EmailAddress, FirstName, NewUser, Password, PasswordHash, PhoneNumber, UniqueField, User,
    UserId, UserValidationError,
};
pub use self::users_query_service::UsersQueryService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use profile_registry::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such user"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
