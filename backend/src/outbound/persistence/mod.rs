//! PostgreSQL persistence adapters using Diesel.
//!
//! Users always live here. Pictures live here too when the relational
//! picture backend is selected.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) are private
//! to this module; repositories translate them into domain values and map
//! Diesel failures into the port error types.
//!
//! # Example
//!
//! ```ignore
//! use profile_registry::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/registry")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_picture_store;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_picture_store::DieselPictureStore;
pub(crate) use diesel_picture_store::stored_content_type;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
