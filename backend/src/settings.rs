//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `REGISTRY_*` environment variables, command-line flags,
//! or a configuration file. Every field is optional at load time; accessors
//! apply defaults and validate.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::RetryPolicy;
use crate::inbound::http::state::{DEFAULT_MAX_PICTURE_BYTES, UploadLimits};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MONGODB_URL: &str = "mongodb://localhost:27017";
const DEFAULT_MONGODB_DATABASE: &str = "user_profiles";
const DEFAULT_MONGODB_COLLECTION: &str = "profiles";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;

/// Errors raised when settings are missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// A required setting was not provided.
    #[error("{name} must be set")]
    Missing {
        /// Setting name.
        name: &'static str,
    },
    /// A setting was provided but could not be parsed.
    #[error("{name} is invalid: {message}")]
    Invalid {
        /// Setting name.
        name: &'static str,
        /// Parse failure description.
        message: String,
    },
}

/// Where profile pictures are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureBackend {
    /// MongoDB collection.
    Document,
    /// PostgreSQL child table.
    Relational,
}

impl FromStr for PictureBackend {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" | "mongodb" => Ok(Self::Document),
            "relational" | "postgres" => Ok(Self::Relational),
            other => Err(SettingsError::Invalid {
                name: "picture_backend",
                message: format!("expected `document` or `relational`, got `{other}`"),
            }),
        }
    }
}

/// Configuration for the registry service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REGISTRY")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// `document` or `relational`.
    pub picture_backend: Option<String>,
    /// MongoDB connection string for the document backend.
    pub mongodb_url: Option<String>,
    /// Database holding the picture collection.
    pub mongodb_database: Option<String>,
    /// Collection holding one document per picture owner.
    pub mongodb_collection: Option<String>,
    /// Upper bound on pooled PostgreSQL connections.
    pub db_max_connections: Option<u32>,
    /// Per-attempt timeout for store calls, in milliseconds.
    pub storage_timeout_ms: Option<u64>,
    /// Attempts per store call, including the first.
    pub retry_max_attempts: Option<u32>,
    /// Delay before the first retry, in milliseconds.
    pub retry_initial_backoff_ms: Option<u64>,
    /// Cap on the retry delay, in milliseconds.
    pub retry_max_backoff_ms: Option<u64>,
    /// Largest accepted profile picture, in bytes.
    pub max_picture_bytes: Option<usize>,
    /// Seconds between orphaned picture sweeps; `0` disables the sweep.
    pub reconcile_interval_secs: Option<u64>,
    /// Apply embedded migrations at start-up.
    pub run_migrations: Option<bool>,
}

impl AppSettings {
    /// Listen address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    /// Returns [`SettingsError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::Invalid {
            name: "bind_addr",
            message: err.to_string(),
        })
    }

    /// PostgreSQL URL, which has no default.
    ///
    /// # Errors
    /// Returns [`SettingsError::Missing`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::Missing {
                name: "database_url",
            })
    }

    /// Selected picture backend, relational unless configured otherwise.
    ///
    /// # Errors
    /// Returns [`SettingsError::Invalid`] for an unknown backend name.
    pub fn picture_backend(&self) -> Result<PictureBackend, SettingsError> {
        self.picture_backend
            .as_deref()
            .map_or(Ok(PictureBackend::Relational), str::parse)
    }

    /// MongoDB URL or the local default.
    #[must_use]
    pub fn mongodb_url(&self) -> &str {
        self.mongodb_url.as_deref().unwrap_or(DEFAULT_MONGODB_URL)
    }

    /// MongoDB database name or `user_profiles`.
    #[must_use]
    pub fn mongodb_database(&self) -> &str {
        self.mongodb_database
            .as_deref()
            .unwrap_or(DEFAULT_MONGODB_DATABASE)
    }

    /// MongoDB collection name or `profiles`.
    #[must_use]
    pub fn mongodb_collection(&self) -> &str {
        self.mongodb_collection
            .as_deref()
            .unwrap_or(DEFAULT_MONGODB_COLLECTION)
    }

    /// Pool size, never below one.
    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .max(1)
    }

    /// Retry policy with configured overrides applied to the defaults.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            attempt_timeout: self
                .storage_timeout_ms
                .map_or(defaults.attempt_timeout, Duration::from_millis),
            max_attempts: self
                .retry_max_attempts
                .map_or(defaults.max_attempts, |attempts| attempts.max(1)),
            initial_backoff: self
                .retry_initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .retry_max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
        }
    }

    /// Multipart limits with the configured picture size cap.
    #[must_use]
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_picture_bytes: self
                .max_picture_bytes
                .unwrap_or(DEFAULT_MAX_PICTURE_BYTES),
            ..UploadLimits::default()
        }
    }

    /// `None` when the sweep is disabled.
    #[must_use]
    pub fn reconcile_interval(&self) -> Option<Duration> {
        match self
            .reconcile_interval_secs
            .unwrap_or(DEFAULT_RECONCILE_INTERVAL_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Whether embedded migrations run at start-up; on by default.
    #[must_use]
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    //! Configuration parsing, defaults and overrides.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 15] = [
        "REGISTRY_BIND_ADDR",
        "REGISTRY_DATABASE_URL",
        "REGISTRY_PICTURE_BACKEND",
        "REGISTRY_MONGODB_URL",
        "REGISTRY_MONGODB_DATABASE",
        "REGISTRY_MONGODB_COLLECTION",
        "REGISTRY_DB_MAX_CONNECTIONS",
        "REGISTRY_STORAGE_TIMEOUT_MS",
        "REGISTRY_RETRY_MAX_ATTEMPTS",
        "REGISTRY_RETRY_INITIAL_BACKOFF_MS",
        "REGISTRY_RETRY_MAX_BACKOFF_MS",
        "REGISTRY_MAX_PICTURE_BYTES",
        "REGISTRY_RECONCILE_INTERVAL_SECS",
        "REGISTRY_RUN_MIGRATIONS",
        "REGISTRY_CONFIG_PATH",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("profile-registry")])
            .expect("config should load")
    }

    fn cleared_except(
        overrides: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared_except(&[]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(
            settings.database_url(),
            Err(SettingsError::Missing {
                name: "database_url"
            })
        );
        assert_eq!(
            settings.picture_backend().expect("backend"),
            PictureBackend::Relational
        );
        assert_eq!(settings.mongodb_url(), DEFAULT_MONGODB_URL);
        assert_eq!(settings.mongodb_database(), "user_profiles");
        assert_eq!(settings.mongodb_collection(), "profiles");
        assert_eq!(settings.db_max_connections(), 10);
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(
            settings.upload_limits().max_picture_bytes,
            DEFAULT_MAX_PICTURE_BYTES
        );
        assert_eq!(
            settings.reconcile_interval(),
            Some(Duration::from_secs(300))
        );
        assert!(settings.run_migrations());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_except(&[
            ("REGISTRY_BIND_ADDR", "127.0.0.1:9000"),
            ("REGISTRY_DATABASE_URL", "postgres://db/registry"),
            ("REGISTRY_PICTURE_BACKEND", "document"),
            ("REGISTRY_MONGODB_DATABASE", "pictures"),
            ("REGISTRY_STORAGE_TIMEOUT_MS", "250"),
            ("REGISTRY_RETRY_MAX_ATTEMPTS", "5"),
            ("REGISTRY_MAX_PICTURE_BYTES", "1024"),
            ("REGISTRY_RECONCILE_INTERVAL_SECS", "0"),
            ("REGISTRY_RUN_MIGRATIONS", "false"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr().expect("bind addr").port(),
            9000
        );
        assert_eq!(settings.database_url(), Ok("postgres://db/registry"));
        assert_eq!(
            settings.picture_backend().expect("backend"),
            PictureBackend::Document
        );
        assert_eq!(settings.mongodb_database(), "pictures");
        let policy = settings.retry_policy();
        assert_eq!(policy.attempt_timeout, Duration::from_millis(250));
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(settings.upload_limits().max_picture_bytes, 1024);
        assert_eq!(settings.reconcile_interval(), None);
        assert!(!settings.run_migrations());
    }

    #[rstest]
    #[case("document", PictureBackend::Document)]
    #[case("MongoDB", PictureBackend::Document)]
    #[case(" relational ", PictureBackend::Relational)]
    fn picture_backend_names_parse(#[case] raw: &str, #[case] expected: PictureBackend) {
        assert_eq!(raw.parse::<PictureBackend>(), Ok(expected));
    }

    #[rstest]
    fn unknown_picture_backend_is_rejected() {
        let err = "s3".parse::<PictureBackend>().expect_err("unknown backend");
        assert!(err.to_string().contains("picture_backend"));
    }
}
