//! Read-side use-cases joining users with their profile pictures.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::domain::ports::{
    PictureStore, PictureStoreError, UserProfile, UserRepository, UserRepositoryError, UsersQuery,
};
use crate::domain::{Error, Idempotency, ProfilePicture, StorageRetry, User, UserId};

/// Query service reading the user store and the picture store.
#[derive(Clone)]
pub struct UsersQueryService {
    users: Arc<dyn UserRepository>,
    pictures: Arc<dyn PictureStore>,
    retry: StorageRetry,
}

impl UsersQueryService {
    /// Wire the service to its driven ports.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        pictures: Arc<dyn PictureStore>,
        retry: StorageRetry,
    ) -> Self {
        Self {
            users,
            pictures,
            retry,
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User, Error> {
        let users = &self.users;
        self.retry
            .run("users.find_by_id", Idempotency::Idempotent, move || {
                users.find_by_id(id)
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_user_rejection))?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn picture_for(&self, id: &UserId) -> Result<Option<ProfilePicture>, Error> {
        let pictures = &self.pictures;
        self.retry
            .run("pictures.get_by_user", Idempotency::Idempotent, move || {
                pictures.get_by_user(id)
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_picture_rejection))
    }
}

#[async_trait]
impl UsersQuery for UsersQueryService {
    async fn list_users(&self) -> Result<Vec<UserProfile>, Error> {
        let users = &self.users;
        let pictures = &self.pictures;
        let listed = self
            .retry
            .run("users.list_all", Idempotency::Idempotent, move || {
                users.list_all()
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_user_rejection))?;
        if listed.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<UserId> = listed.iter().map(User::id).collect();
        let owners = ids.as_slice();
        let mut found = self
            .retry
            .run("pictures.get_for_users", Idempotency::Idempotent, move || {
                pictures.get_for_users(owners)
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_picture_rejection))?;

        Ok(listed
            .into_iter()
            .map(|user| {
                let picture = found.remove(&user.id());
                UserProfile { user, picture }
            })
            .collect())
    }

    async fn get_user(&self, id: &UserId) -> Result<UserProfile, Error> {
        let user = self.require_user(id).await?;
        let picture = self.picture_for(id).await?;
        Ok(UserProfile { user, picture })
    }

    async fn get_profile_picture(&self, id: &UserId) -> Result<ProfilePicture, Error> {
        self.require_user(id).await?;
        self.picture_for(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {id} has no profile picture")))
    }
}

fn map_user_rejection(error: UserRepositoryError) -> Error {
    error!(error = %error, "user store rejected read");
    Error::internal(error.to_string())
}

fn map_picture_rejection(error: PictureStoreError) -> Error {
    error!(error = %error, "picture store rejected read");
    Error::internal(error.to_string())
}
