//! Driving port for user registration.
//!
//! Inbound adapters parse and validate the submitted form into a
//! [`RegistrationRequest`] and hand it to this port. Storage coordination and
//! compensation live behind it.

use async_trait::async_trait;

use crate::domain::{
    EmailAddress, Error, FirstName, Password, PhoneNumber, PictureRef, ProfilePicture, UserId,
};

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Requested first name.
    pub first_name: FirstName,
    /// Requested email address.
    pub email: EmailAddress,
    /// Requested phone number.
    pub phone: PhoneNumber,
    /// Plaintext password, hashed before storage.
    pub password: Password,
    /// Optional profile picture; absence is a valid user state.
    pub picture: Option<ProfilePicture>,
}

/// Identifiers produced by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Store-assigned user identifier.
    pub user_id: UserId,
    /// Picture store reference when a picture was saved.
    pub picture_ref: Option<PictureRef>,
}

/// Driving port for the registration use-case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRegistration: Send + Sync {
    /// Register a user and, if supplied, store their profile picture.
    ///
    /// Either both records are stored or the error describes what was left
    /// behind ([`crate::domain::ErrorCode::PartialWrite`]).
    async fn register(&self, request: RegistrationRequest) -> Result<RegistrationOutcome, Error>;
}
