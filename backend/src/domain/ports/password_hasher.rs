//! Port for one-way password hashing.

use async_trait::async_trait;

use crate::domain::{Password, PasswordHash};

use super::define_port_error;

define_port_error! {
    /// Errors raised while hashing a password.
    pub enum PasswordHashError {
        /// The hashing backend failed.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Port for turning a plaintext password into a storable hash.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a salted, encoded hash of `password`.
    async fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError>;
}
