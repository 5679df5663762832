//! Driving port for user-facing reads.
//!
//! Inbound adapters (HTTP handlers) use this port to fetch users together
//! with their profile picture without importing storage concerns.

use async_trait::async_trait;

use crate::domain::{Error, ProfilePicture, User, UserId};

/// A user joined with the picture they own, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// The user row.
    pub user: User,
    /// Their picture, or `None` when they have none.
    pub picture: Option<ProfilePicture>,
}

/// Driving port for reading users and their pictures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Every user ordered by identifier, each with its picture or `None`.
    async fn list_users(&self) -> Result<Vec<UserProfile>, Error>;

    /// One user with its picture; `not_found` when the id is unknown.
    async fn get_user(&self, id: &UserId) -> Result<UserProfile, Error>;

    /// Picture owned by a user; `not_found` when the user or the picture is
    /// missing.
    async fn get_profile_picture(&self, id: &UserId) -> Result<ProfilePicture, Error>;
}
