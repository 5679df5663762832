//! Multipart parsing and validation for `POST /register`.
//!
//! Text parts `first_name`, `email`, `password` and `phone` are required. The
//! `profile_picture` file part is optional; an empty part counts as absent.
//! Unknown parts are drained and ignored, and a repeated part keeps its last
//! value.

use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::StreamExt;
use tracing::debug;

use crate::domain::ports::RegistrationRequest;
use crate::domain::{
    ContentType, EmailAddress, Error, FirstName, Password, PhoneNumber, PictureValidationError,
    ProfilePicture, UserValidationError,
};
use crate::inbound::http::state::UploadLimits;

const PICTURE_FIELD: &str = "profile_picture";

#[derive(Default)]
struct RawForm {
    first_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    phone: Option<String>,
    picture: Option<RawPicture>,
}

struct RawPicture {
    bytes: Vec<u8>,
    content_type: Option<String>,
}

/// Read the multipart payload into a validated [`RegistrationRequest`].
pub async fn read_registration_form(
    mut payload: Multipart,
    limits: UploadLimits,
) -> Result<RegistrationRequest, Error> {
    let mut form = RawForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_name())
            .unwrap_or_default()
            .to_owned();

        match name.as_str() {
            "first_name" => form.first_name = Some(read_text(&mut field, &name, limits).await?),
            "email" => form.email = Some(read_text(&mut field, &name, limits).await?),
            "password" => form.password = Some(read_text(&mut field, &name, limits).await?),
            "phone" => form.phone = Some(read_text(&mut field, &name, limits).await?),
            PICTURE_FIELD => form.picture = read_picture(&mut field, limits).await?,
            other => {
                debug!(field = other, "ignoring unknown multipart field");
                drain(&mut field).await?;
            }
        }
    }

    form.into_request()
}

impl RawForm {
    fn into_request(self) -> Result<RegistrationRequest, Error> {
        let first_name = FirstName::new(required(self.first_name, "first_name")?)
            .map_err(map_user_validation)?;
        let email = EmailAddress::new(required(self.email, "email")?).map_err(map_user_validation)?;
        let password =
            Password::new(required(self.password, "password")?).map_err(map_user_validation)?;
        let phone = PhoneNumber::new(required(self.phone, "phone")?).map_err(map_user_validation)?;
        let picture = self.picture.map(RawPicture::into_picture).transpose()?;

        Ok(RegistrationRequest {
            first_name,
            email,
            phone,
            password,
            picture,
        })
    }
}

impl RawPicture {
    fn into_picture(self) -> Result<ProfilePicture, Error> {
        let content_type = self
            .content_type
            .map(|raw| {
                let parsed = ContentType::new(raw).map_err(map_picture_validation)?;
                if parsed.is_image() {
                    Ok(parsed)
                } else {
                    Err(map_picture_validation(PictureValidationError::NotAnImage))
                }
            })
            .transpose()?;
        ProfilePicture::new(self.bytes, content_type).map_err(map_picture_validation)
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, Error> {
    value.ok_or_else(|| Error::invalid_field(field, format!("{field} is required")))
}

async fn read_text(field: &mut Field, name: &str, limits: UploadLimits) -> Result<String, Error> {
    let bytes = read_bounded(field, limits.max_text_field_bytes)
        .await?
        .ok_or_else(|| {
            Error::invalid_field(
                name,
                format!(
                    "{name} must be at most {} bytes",
                    limits.max_text_field_bytes
                ),
            )
        })?;
    String::from_utf8(bytes)
        .map_err(|_| Error::invalid_field(name, format!("{name} must be valid UTF-8")))
}

async fn read_picture(field: &mut Field, limits: UploadLimits) -> Result<Option<RawPicture>, Error> {
    let content_type = field.content_type().map(ToString::to_string);
    let bytes = read_bounded(field, limits.max_picture_bytes)
        .await?
        .ok_or_else(|| {
            map_picture_validation(PictureValidationError::TooLarge {
                max: limits.max_picture_bytes,
            })
        })?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(RawPicture {
        bytes,
        content_type,
    }))
}

/// Collect a part's body, returning `None` once it exceeds `max` bytes.
async fn read_bounded(field: &mut Field, max: usize) -> Result<Option<Vec<u8>>, Error> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if buffer.len().saturating_add(chunk.len()) > max {
            return Ok(None);
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(Some(buffer))
}

async fn drain(field: &mut Field) -> Result<(), Error> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed)?;
    }
    Ok(())
}

fn malformed(err: MultipartError) -> Error {
    Error::invalid_request(format!("malformed multipart body: {err}"))
}

fn map_user_validation(err: UserValidationError) -> Error {
    Error::invalid_field(err.field(), err.to_string())
}

fn map_picture_validation(err: PictureValidationError) -> Error {
    Error::invalid_field(PICTURE_FIELD, err.to_string())
}
