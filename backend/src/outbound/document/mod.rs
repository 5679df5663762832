//! Document-store adapters.
//!
//! MongoDB holds profile pictures when the document picture backend is
//! selected; users stay in PostgreSQL.

mod mongo_picture_store;

pub use mongo_picture_store::{MongoConfig, MongoPictureStore};
