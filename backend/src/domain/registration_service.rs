//! Registration use-case spanning the user store and the picture store.
//!
//! The two stores share no transaction. The user row is written first; if the
//! picture write then fails, the service compensates by deleting whatever
//! picture landed and the user row, and returns the picture error. Only when
//! that rollback fails does the caller see a partial write. Pictures that
//! outlive their owner are swept by [`crate::domain::PictureReconciler`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::ports::{
    PasswordHasher, PictureStore, PictureStoreError, RegistrationOutcome, RegistrationRequest,
    UserRegistration, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Error, Idempotency, NewUser, PictureRef, ProfilePicture, StorageRetry, UniqueField, User,
    UserId,
};

/// Registration service backed by a user repository and a picture store.
#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    pictures: Arc<dyn PictureStore>,
    hasher: Arc<dyn PasswordHasher>,
    retry: StorageRetry,
}

impl RegistrationService {
    /// Wire the service to its driven ports.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserRepository>,
        pictures: Arc<dyn PictureStore>,
        hasher: Arc<dyn PasswordHasher>,
        retry: StorageRetry,
    ) -> Self {
        Self {
            users,
            pictures,
            hasher,
            retry,
        }
    }

    async fn insert_user(&self, new_user: &NewUser) -> Result<User, Error> {
        let users = &self.users;
        let conflict = self
            .retry
            .run("users.find_conflict", Idempotency::Idempotent, move || {
                users.find_conflict(new_user)
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_user_rejection))?;
        if let Some(field) = conflict {
            return Err(conflict_error(field));
        }

        self.retry
            .run("users.insert", Idempotency::NonIdempotent, move || {
                users.insert(new_user)
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_user_rejection))
    }

    async fn store_picture(
        &self,
        user_id: UserId,
        picture: &ProfilePicture,
    ) -> Result<PictureRef, Error> {
        let pictures = &self.pictures;
        let owner = &user_id;
        self.retry
            .run("pictures.put", Idempotency::Idempotent, move || {
                pictures.put(owner, picture)
            })
            .await
            .map_err(|failure| failure.into_domain_error(map_picture_rejection))
    }

    /// Undo a registration whose picture write failed. Returns the error the
    /// caller should see.
    async fn compensate(&self, user_id: UserId, cause: Error) -> Error {
        warn!(user_id = %user_id, error = %cause, "picture write failed; rolling back user");
        let pictures = &self.pictures;
        let users = &self.users;
        let owner = &user_id;

        if let Err(failure) = self
            .retry
            .run("pictures.delete_by_user", Idempotency::Idempotent, move || {
                pictures.delete_by_user(owner)
            })
            .await
        {
            warn!(
                user_id = %user_id,
                error = %failure,
                "could not remove picture during rollback; leaving it to reconciliation"
            );
        }

        match self
            .retry
            .run("users.delete", Idempotency::Idempotent, move || {
                users.delete(owner)
            })
            .await
        {
            Ok(_) => {
                info!(user_id = %user_id, "registration rolled back");
                cause
            }
            Err(failure) => {
                error!(
                    user_id = %user_id,
                    error = %failure,
                    cause = %cause,
                    "registration rollback failed; user stored without picture"
                );
                Error::partial_write(format!(
                    "user {user_id} was stored but the profile picture was not and the user could not be removed"
                ))
                .with_details(json!({
                    "user_id": user_id.to_string(),
                    "cause": cause.code(),
                }))
            }
        }
    }
}

#[async_trait]
impl UserRegistration for RegistrationService {
    async fn register(&self, request: RegistrationRequest) -> Result<RegistrationOutcome, Error> {
        let RegistrationRequest {
            first_name,
            email,
            phone,
            password,
            picture,
        } = request;

        let password_hash = self.hasher.hash(&password).await.map_err(|err| {
            error!(error = %err, "password hashing failed");
            Error::internal(err.to_string())
        })?;
        let new_user = NewUser {
            first_name,
            email,
            phone,
            password_hash,
        };

        let user = self.insert_user(&new_user).await?;
        let user_id = user.id();

        let picture_ref = match picture {
            None => None,
            Some(picture) => match self.store_picture(user_id, &picture).await {
                Ok(reference) => Some(reference),
                Err(cause) => return Err(self.compensate(user_id, cause).await),
            },
        };

        info!(
            user_id = %user_id,
            has_picture = picture_ref.is_some(),
            "user registered"
        );
        Ok(RegistrationOutcome {
            user_id,
            picture_ref,
        })
    }
}

fn conflict_error(field: UniqueField) -> Error {
    Error::conflict(format!("{field} is already registered"), field.as_str())
}

fn map_user_rejection(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Duplicate { field } => conflict_error(field),
        other => {
            error!(error = %other, "user store rejected operation");
            Error::internal(other.to_string())
        }
    }
}

fn map_picture_rejection(error: PictureStoreError) -> Error {
    error!(error = %error, "picture store rejected operation");
    Error::internal(error.to_string())
}
