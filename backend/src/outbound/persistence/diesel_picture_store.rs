//! PostgreSQL child-table `PictureStore`.
//!
//! Pictures live in `profile_pictures`, keyed uniquely by `user_id` and
//! removed together with their owner. A put is an upsert on `user_id`; the
//! returned reference is the row id in decimal.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{PictureStore, PictureStoreError};
use crate::domain::{ContentType, PictureRef, ProfilePicture, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewPictureRow, PictureRow};
use super::pool::{DbPool, PoolError};
use super::schema::profile_pictures;

/// Diesel implementation of the [`PictureStore`] port.
#[derive(Clone)]
pub struct DieselPictureStore {
    pool: DbPool,
}

impl DieselPictureStore {
    /// Serve the `profile_pictures` table from `pool`.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PictureStoreError {
    map_pool_error(error, PictureStoreError::connection)
}

fn diesel_error(error: diesel::result::Error) -> PictureStoreError {
    map_diesel_error(error, PictureStoreError::query, PictureStoreError::connection)
}

/// Parse a stored content type, dropping values that no longer validate.
pub(crate) fn stored_content_type(stored: Option<String>, user_id: i64) -> Option<ContentType> {
    let raw = stored?;
    match ContentType::new(raw.as_str()) {
        Ok(content_type) => Some(content_type),
        Err(err) => {
            warn!(user_id, value = %raw, error = %err, "ignoring invalid stored content type");
            None
        }
    }
}

fn owner_id(raw: i64) -> Result<UserId, PictureStoreError> {
    UserId::new(raw)
        .map_err(|err| PictureStoreError::query(format!("stored picture owner {raw} is invalid: {err}")))
}

impl PictureRow {
    fn into_entry(self) -> Result<(UserId, ProfilePicture), PictureStoreError> {
        let owner = owner_id(self.user_id)?;
        let content_type = stored_content_type(self.content_type, self.user_id);
        let picture = ProfilePicture::new(self.profile_picture, content_type).map_err(|err| {
            PictureStoreError::query(format!("stored picture for user {owner} is invalid: {err}"))
        })?;
        Ok((owner, picture))
    }
}

#[async_trait]
impl PictureStore for DieselPictureStore {
    async fn put(
        &self,
        user_id: &UserId,
        picture: &ProfilePicture,
    ) -> Result<PictureRef, PictureStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = NewPictureRow {
            user_id: user_id.value(),
            profile_picture: picture.bytes(),
            content_type: picture.content_type().map(AsRef::as_ref),
        };
        let id: i64 = diesel::insert_into(profile_pictures::table)
            .values(&row)
            .on_conflict(profile_pictures::user_id)
            .do_update()
            .set((
                profile_pictures::profile_picture.eq(excluded(profile_pictures::profile_picture)),
                profile_pictures::content_type.eq(excluded(profile_pictures::content_type)),
            ))
            .returning(profile_pictures::id)
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        PictureRef::new(id.to_string()).map_err(|err| PictureStoreError::query(err.to_string()))
    }

    async fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfilePicture>, PictureStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<PictureRow> = profile_pictures::table
            .filter(profile_pictures::user_id.eq(user_id.value()))
            .select(PictureRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(|row| row.into_entry().map(|(_, picture)| picture))
            .transpose()
    }

    async fn get_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ProfilePicture>, PictureStoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let raw: Vec<i64> = user_ids.iter().map(|id| id.value()).collect();
        let rows: Vec<PictureRow> = profile_pictures::table
            .filter(profile_pictures::user_id.eq_any(raw))
            .select(PictureRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        rows.into_iter().map(PictureRow::into_entry).collect()
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, PictureStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let deleted = diesel::delete(
            profile_pictures::table.filter(profile_pictures::user_id.eq(user_id.value())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(deleted > 0)
    }

    async fn owner_ids(&self) -> Result<Vec<UserId>, PictureStoreError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let owners: Vec<i64> = profile_pictures::table
            .select(profile_pictures::user_id)
            .order(profile_pictures::user_id.asc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        owners.into_iter().map(owner_id).collect()
    }
}
