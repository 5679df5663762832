//! Port for profile picture storage.
//!
//! Two adapters implement [`PictureStore`]: a MongoDB collection and a
//! PostgreSQL child table. Services depend only on this trait.
//!
//! Every adapter keeps at most one picture per user: [`PictureStore::put`]
//! replaces any picture already stored for the same user.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{PictureRef, ProfilePicture, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by picture store adapters.
    pub enum PictureStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "picture store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "picture store query failed: {message}",
    }
}

/// Port for the picture store, keyed by owning user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Store (or replace) the picture owned by `user_id`.
    async fn put(
        &self,
        user_id: &UserId,
        picture: &ProfilePicture,
    ) -> Result<PictureRef, PictureStoreError>;

    /// Fetch the picture owned by `user_id`, if any.
    async fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfilePicture>, PictureStoreError>;

    /// Fetch pictures for many users in one round trip. Users without a
    /// picture are absent from the map.
    async fn get_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ProfilePicture>, PictureStoreError>;

    /// Delete the picture owned by `user_id`. Returns `false` when there was
    /// none.
    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, PictureStoreError>;

    /// Distinct owners of stored pictures.
    async fn owner_ids(&self) -> Result<Vec<UserId>, PictureStoreError>;
}
