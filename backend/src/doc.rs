//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the user endpoints, the health checks and the
//! response schemas. It backs Swagger UI (debug builds) and the
//! `openapi-dump` binary.

use utoipa::OpenApi;

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{
    PictureBody, RegistrationForm, RegistrationResponse, UserBody, UserDetailResponse,
    UserSummary,
};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Profile registry API",
        description = "User registration with profile pictures, user listing and health checks."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::get_profile_picture,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        RegistrationForm,
        RegistrationResponse,
        UserSummary,
        UserBody,
        PictureBody,
        UserDetailResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "users", description = "Registration and user lookup"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
/// OpenAPI document for the registry's HTTP surface.
pub struct ApiDoc;
