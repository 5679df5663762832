//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{UserRegistration, UsersQuery};

/// Default ceiling for an uploaded profile picture (5 MiB).
pub const DEFAULT_MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Limits applied while reading multipart uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Largest accepted profile picture payload.
    pub max_picture_bytes: usize,
    /// Largest accepted text field value.
    pub max_text_field_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_picture_bytes: DEFAULT_MAX_PICTURE_BYTES,
            max_text_field_bytes: 4 * 1024,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration use-case.
    pub registration: Arc<dyn UserRegistration>,
    /// Read-side use-case for listings and lookups.
    pub users: Arc<dyn UsersQuery>,
    /// Multipart size limits.
    pub uploads: UploadLimits,
}

impl HttpState {
    /// Construct state from the driving ports and upload limits.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use profile_registry::domain::ports::{UserRegistration, UsersQuery};
    /// use profile_registry::inbound::http::state::{HttpState, UploadLimits};
    ///
    /// fn build(
    ///     registration: Arc<dyn UserRegistration>,
    ///     users: Arc<dyn UsersQuery>,
    /// ) -> HttpState {
    ///     HttpState::new(registration, users, UploadLimits::default())
    /// }
    /// ```
    #[must_use]
    pub fn new(
        registration: Arc<dyn UserRegistration>,
        users: Arc<dyn UsersQuery>,
        uploads: UploadLimits,
    ) -> Self {
        Self {
            registration,
            users,
            uploads,
        }
    }
}
