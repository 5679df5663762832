//! Users API handlers.
//!
//! ```text
//! POST /register                   (multipart/form-data)
//! GET  /users
//! GET  /user/{id}
//! GET  /user/{id}/profile_picture
//! ```

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{RegistrationOutcome, UserProfile};
use crate::domain::{Error, ProfilePicture, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::registration_form::read_registration_form;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Multipart body accepted by `POST /register` (documentation only).
#[derive(ToSchema)]
#[expect(dead_code, reason = "multipart body schema exists only for OpenAPI")]
pub struct RegistrationForm {
    /// Unique first name.
    #[schema(example = "Ana")]
    first_name: String,
    /// Unique email address.
    #[schema(example = "ana@x.com")]
    email: String,
    /// Plaintext password; only its hash is stored.
    #[schema(example = "p", format = Password)]
    password: String,
    /// Unique phone number.
    #[schema(example = "555")]
    phone: String,
    /// Optional image file; an empty part is treated as absent.
    #[schema(value_type = Option<String>, format = Binary)]
    profile_picture: Option<Vec<u8>>,
}

/// Response body for a successful registration.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegistrationResponse {
    /// New user's identifier, as a decimal string.
    #[schema(example = "1")]
    pub user_id: String,
    /// Picture store reference, or `null` without a picture.
    #[schema(example = "6650f0c2a1b2c3d4e5f60718")]
    pub profile_picture_id: Option<String>,
    /// Fixed confirmation text.
    #[schema(example = "User registered successfully")]
    pub message: String,
}

impl From<RegistrationOutcome> for RegistrationResponse {
    fn from(outcome: RegistrationOutcome) -> Self {
        Self {
            user_id: outcome.user_id.to_string(),
            profile_picture_id: outcome.picture_ref.map(String::from),
            message: "User registered successfully".to_owned(),
        }
    }
}

/// Entry of `GET /users`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    /// User identifier.
    #[schema(example = 1)]
    pub id: i64,
    /// First name.
    #[schema(example = "Ana")]
    pub first_name: String,
    /// Email address.
    #[schema(example = "ana@x.com")]
    pub email: String,
    /// Phone number.
    #[schema(example = "555")]
    pub phone: String,
    /// `data:<content-type>;base64,<payload>`, or `null` without a picture.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub profile_picture_url: Option<String>,
}

impl From<UserProfile> for UserSummary {
    fn from(profile: UserProfile) -> Self {
        let UserBody {
            id,
            first_name,
            email,
            phone,
        } = UserBody::from(&profile.user);
        Self {
            id,
            first_name,
            email,
            phone,
            profile_picture_url: profile.picture.as_ref().map(ProfilePicture::data_uri),
        }
    }
}

/// Identity fields of a user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserBody {
    /// User identifier.
    #[schema(example = 1)]
    pub id: i64,
    /// First name.
    #[schema(example = "Ana")]
    pub first_name: String,
    /// Email address.
    #[schema(example = "ana@x.com")]
    pub email: String,
    /// Phone number.
    #[schema(example = "555")]
    pub phone: String,
}

impl From<&User> for UserBody {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().value(),
            first_name: user.first_name().to_string(),
            email: user.email().to_string(),
            phone: user.phone().to_string(),
        }
    }
}

/// Picture metadata and inline payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PictureBody {
    /// Declared media type, or `null` when none was recorded.
    #[schema(example = "image/png")]
    pub content_type: Option<String>,
    /// Payload length in bytes.
    #[schema(example = 10)]
    pub size_bytes: usize,
    /// Payload as a base64 data URI.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub data_url: String,
}

impl From<&ProfilePicture> for PictureBody {
    fn from(picture: &ProfilePicture) -> Self {
        Self {
            content_type: picture.content_type().map(ToString::to_string),
            size_bytes: picture.size_bytes(),
            data_url: picture.data_uri(),
        }
    }
}

/// Response body of `GET /user/{id}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDetailResponse {
    /// Identity fields.
    pub user: UserBody,
    /// Picture details, or `null` without a picture.
    pub profile_picture: Option<PictureBody>,
}

impl From<UserProfile> for UserDetailResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            user: UserBody::from(&profile.user),
            profile_picture: profile.picture.as_ref().map(PictureBody::from),
        }
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    raw.parse::<UserId>()
        .map_err(|err| Error::invalid_field("id", err.to_string()))
}

/// Register a user with an optional profile picture.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use profile_registry::inbound::http::users::register;
///
/// let app = App::new().service(register);
/// ```
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegistrationForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered", body = RegistrationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "First name, email or phone already registered", body = ErrorSchema),
        (status = 500, description = "Internal error or partial write", body = ErrorSchema),
        (status = 503, description = "A store is unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "registerUser"
)]
#[post("/register")]
pub async fn register(state: web::Data<HttpState>, payload: Multipart) -> ApiResult<HttpResponse> {
    let request = read_registration_form(payload, state.uploads).await?;
    let outcome = state.registration.register(request).await?;
    Ok(HttpResponse::Created().json(RegistrationResponse::from(outcome)))
}

/// List every user with an inline profile picture.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users ordered by id", body = [UserSummary]),
        (status = 500, description = "Internal server error", body = ErrorSchema),
        (status = 503, description = "A store is unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<UserSummary>>> {
    let profiles = state.users.list_users().await?;
    Ok(web::Json(
        profiles.into_iter().map(UserSummary::from).collect(),
    ))
}

/// Fetch one user with picture metadata.
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserDetailResponse),
        (status = 400, description = "Invalid user id", body = ErrorSchema),
        (status = 404, description = "User not found", body = ErrorSchema),
        (status = 503, description = "A store is unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/user/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserDetailResponse>> {
    let id = parse_user_id(&path)?;
    let profile = state.users.get_user(&id).await?;
    Ok(web::Json(UserDetailResponse::from(profile)))
}

/// Download a user's profile picture as raw bytes.
#[utoipa::path(
    get,
    path = "/user/{id}/profile_picture",
    params(("id" = i64, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Picture bytes", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid user id", body = ErrorSchema),
        (status = 404, description = "User or picture not found", body = ErrorSchema),
        (status = 503, description = "A store is unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getProfilePicture"
)]
#[get("/user/{id}/profile_picture")]
pub async fn get_profile_picture(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path)?;
    let picture = state.users.get_profile_picture(&id).await?;
    let media_type = picture.media_type().to_owned();
    let (bytes, _) = picture.into_parts();
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, media_type))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .body(bytes))
}
