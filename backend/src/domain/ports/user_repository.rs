//! Port abstraction for user persistence adapters and their errors.
//!
//! The store is the final arbiter of uniqueness: [`UserRepository::insert`]
//! must report a constraint violation as
//! [`UserRepositoryError::Duplicate`] naming the colliding field, even when
//! [`UserRepository::find_conflict`] saw no collision a moment earlier.

use async_trait::async_trait;

use crate::domain::{NewUser, UniqueField, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A uniqueness constraint rejected the insert.
        Duplicate { field: UniqueField } => "user with this {field} already exists",
    }
}

/// Port for the authoritative user store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Report the first unique field of `candidate` already held by another
    /// user, checking email, then phone, then first name.
    async fn find_conflict(
        &self,
        candidate: &NewUser,
    ) -> Result<Option<UniqueField>, UserRepositoryError>;

    /// Insert a user and return it with its store-assigned identifier.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Delete a user. Returns `false` when no such user existed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserRepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError>;

    /// List every user ordered by identifier ascending.
    async fn list_all(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Return the subset of `ids` that belong to existing users.
    async fn existing_ids(&self, ids: &[UserId]) -> Result<Vec<UserId>, UserRepositoryError>;
}
