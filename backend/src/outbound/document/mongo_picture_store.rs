//! MongoDB-backed `PictureStore`.
//!
//! One document per user:
//! `{_id: ObjectId, user_id: i64, profile_picture: Binary, content_type: string|null}`.
//! A unique index on `user_id` is created on connect, and writes are
//! `find_one_and_update` upserts keyed by `user_id`, so repeating a put
//! replaces the picture instead of adding a second one. The returned
//! reference is the document's `ObjectId` in hex.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, Bson, Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::ports::{PictureStore, PictureStoreError};
use crate::domain::{PictureRef, ProfilePicture, UserId};
use crate::outbound::persistence::stored_content_type;

/// Connection settings for [`MongoPictureStore`].
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// MongoDB connection string.
    pub url: String,
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
    /// Bound on server selection, so an unreachable server fails fast.
    pub server_selection_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PictureDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    user_id: i64,
    profile_picture: Binary,
    content_type: Option<String>,
}

impl PictureDocument {
    fn into_entry(self) -> Result<(UserId, ProfilePicture), PictureStoreError> {
        let owner = UserId::new(self.user_id).map_err(|err| {
            PictureStoreError::query(format!(
                "picture document {} has invalid owner: {err}",
                self.id.to_hex()
            ))
        })?;
        let content_type = stored_content_type(self.content_type, self.user_id);
        let picture = ProfilePicture::new(self.profile_picture.bytes, content_type).map_err(
            |err| PictureStoreError::query(format!("stored picture for user {owner} is invalid: {err}")),
        )?;
        Ok((owner, picture))
    }
}

fn user_filter(user_id: &UserId) -> Document {
    doc! { "user_id": user_id.value() }
}

fn upsert_update(picture: &ProfilePicture) -> Document {
    let payload = Binary {
        subtype: BinarySubtype::Generic,
        bytes: picture.bytes().to_vec(),
    };
    let content_type: Bson = picture
        .content_type()
        .map_or(Bson::Null, |value| Bson::String(value.to_string()));
    doc! {
        "$set": {
            "profile_picture": payload,
            "content_type": content_type,
        }
    }
}

/// Classify driver errors: network and server-selection failures are
/// transient, everything else is a query error.
fn map_mongo_error(error: &mongodb::error::Error) -> PictureStoreError {
    debug!(error = %error, "mongodb operation failed");
    match error.kind.as_ref() {
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => {
            PictureStoreError::connection(error.to_string())
        }
        _ => PictureStoreError::query(error.to_string()),
    }
}

/// MongoDB implementation of the [`PictureStore`] port.
#[derive(Clone)]
pub struct MongoPictureStore {
    collection: Collection<PictureDocument>,
}

impl MongoPictureStore {
    /// Connect, select the collection and ensure the `user_id` unique index.
    ///
    /// # Errors
    ///
    /// Returns [`PictureStoreError::Connection`] when the URL is unusable or
    /// the server cannot be reached to create the index.
    pub async fn connect(config: &MongoConfig) -> Result<Self, PictureStoreError> {
        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|err| PictureStoreError::connection(err.to_string()))?;
        options.server_selection_timeout = Some(config.server_selection_timeout);
        options.app_name = Some("profile-registry".to_owned());

        let client = Client::with_options(options)
            .map_err(|err| PictureStoreError::connection(err.to_string()))?;
        let collection = client
            .database(&config.database)
            .collection::<PictureDocument>(&config.collection);

        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_owned())
                    .build(),
            )
            .build();
        collection
            .create_index(index)
            .await
            .map_err(|err| PictureStoreError::connection(err.to_string()))?;

        info!(
            database = %config.database,
            collection = %config.collection,
            "mongodb picture store ready"
        );
        Ok(Self { collection })
    }
}

#[async_trait]
impl PictureStore for MongoPictureStore {
    async fn put(
        &self,
        user_id: &UserId,
        picture: &ProfilePicture,
    ) -> Result<PictureRef, PictureStoreError> {
        let stored = self
            .collection
            .find_one_and_update(user_filter(user_id), upsert_update(picture))
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|err| map_mongo_error(&err))?
            .ok_or_else(|| PictureStoreError::query("upsert returned no document"))?;

        PictureRef::new(stored.id.to_hex()).map_err(|err| PictureStoreError::query(err.to_string()))
    }

    async fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ProfilePicture>, PictureStoreError> {
        let found = self
            .collection
            .find_one(user_filter(user_id))
            .await
            .map_err(|err| map_mongo_error(&err))?;

        found
            .map(|document| document.into_entry().map(|(_, picture)| picture))
            .transpose()
    }

    async fn get_for_users(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, ProfilePicture>, PictureStoreError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let raw: Vec<i64> = user_ids.iter().map(|id| id.value()).collect();
        let documents: Vec<PictureDocument> = self
            .collection
            .find(doc! { "user_id": { "$in": raw } })
            .await
            .map_err(|err| map_mongo_error(&err))?
            .try_collect()
            .await
            .map_err(|err| map_mongo_error(&err))?;

        documents
            .into_iter()
            .map(PictureDocument::into_entry)
            .collect()
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<bool, PictureStoreError> {
        let result = self
            .collection
            .delete_many(user_filter(user_id))
            .await
            .map_err(|err| map_mongo_error(&err))?;
        Ok(result.deleted_count > 0)
    }

    async fn owner_ids(&self) -> Result<Vec<UserId>, PictureStoreError> {
        let values = self
            .collection
            .distinct("user_id", doc! {})
            .await
            .map_err(|err| map_mongo_error(&err))?;

        let mut owners = values
            .into_iter()
            .map(|value| {
                let raw = match value {
                    Bson::Int64(raw) => raw,
                    Bson::Int32(raw) => i64::from(raw),
                    other => {
                        return Err(PictureStoreError::query(format!(
                            "unexpected user_id value {other}"
                        )));
                    }
                };
                UserId::new(raw).map_err(|err| {
                    PictureStoreError::query(format!("stored picture owner {raw} is invalid: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        owners.sort_unstable();
        Ok(owners)
    }
}
