//! Builders wiring storage adapters into services and HTTP state.
//!
//! Store clients are created once here and shared through `Arc<dyn Port>`.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::domain::ports::{PasswordHasher, PictureStore, PictureStoreError, UserRepository};
use crate::domain::{PictureReconciler, RegistrationService, StorageRetry, UsersQueryService};
use crate::inbound::http::state::{HttpState, UploadLimits};
use crate::outbound::crypto::Argon2PasswordHasher;
use crate::outbound::document::{MongoConfig, MongoPictureStore};
use crate::outbound::persistence::{
    DbPool, DieselPictureStore, DieselUserRepository, MigrationError, PoolConfig, PoolError,
    run_pending_migrations,
};
use crate::settings::{AppSettings, PictureBackend, SettingsError};

/// Failures that prevent the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration was missing or malformed.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The PostgreSQL pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Schema migrations failed.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// The MongoDB picture store could not be opened.
    #[error(transparent)]
    PictureStore(#[from] PictureStoreError),
}

/// The driven ports every service is built from.
#[derive(Clone)]
pub struct StoragePorts {
    /// Authoritative user rows.
    pub users: Arc<dyn UserRepository>,
    /// Picture storage for the configured backend.
    pub pictures: Arc<dyn PictureStore>,
    /// Password hashing for new registrations.
    pub hasher: Arc<dyn PasswordHasher>,
}

impl StoragePorts {
    /// Connect to PostgreSQL (and MongoDB for the document backend), running
    /// migrations first when enabled.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] for invalid settings or unreachable stores.
    pub async fn connect(settings: &AppSettings) -> Result<Self, StartupError> {
        let database_url = settings.database_url()?;
        let backend = settings.picture_backend()?;
        let retry = settings.retry_policy();

        if settings.run_migrations() {
            run_pending_migrations(database_url).await?;
        }

        let pool = DbPool::new(
            PoolConfig::new(database_url)
                .with_max_size(settings.db_max_connections())
                .with_connection_timeout(retry.attempt_timeout),
        )
        .await?;

        let pictures: Arc<dyn PictureStore> = match backend {
            PictureBackend::Relational => Arc::new(DieselPictureStore::new(pool.clone())),
            PictureBackend::Document => {
                let config = MongoConfig {
                    url: settings.mongodb_url().to_owned(),
                    database: settings.mongodb_database().to_owned(),
                    collection: settings.mongodb_collection().to_owned(),
                    server_selection_timeout: retry.attempt_timeout.max(Duration::from_secs(1)),
                };
                Arc::new(MongoPictureStore::connect(&config).await?)
            }
        };
        info!(backend = ?backend, "storage adapters ready");

        Ok(Self {
            users: Arc::new(DieselUserRepository::new(pool)),
            pictures,
            hasher: Arc::new(Argon2PasswordHasher::new()),
        })
    }
}

/// Build the HTTP handler state from storage ports.
#[must_use]
pub fn build_http_state(ports: &StoragePorts, retry: &StorageRetry, uploads: UploadLimits) -> HttpState {
    let registration = RegistrationService::new(
        Arc::clone(&ports.users),
        Arc::clone(&ports.pictures),
        Arc::clone(&ports.hasher),
        retry.clone(),
    );
    let users = UsersQueryService::new(
        Arc::clone(&ports.users),
        Arc::clone(&ports.pictures),
        retry.clone(),
    );
    HttpState::new(Arc::new(registration), Arc::new(users), uploads)
}

/// Build the orphaned picture sweep from storage ports.
#[must_use]
pub fn build_reconciler(ports: &StoragePorts, retry: &StorageRetry) -> PictureReconciler {
    PictureReconciler::new(
        Arc::clone(&ports.users),
        Arc::clone(&ports.pictures),
        retry.clone(),
    )
}
