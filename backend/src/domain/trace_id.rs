//! Correlation identifiers for requests and background sweeps.
//!
//! The active [`TraceId`] lives in a Tokio task-local, so `Error`
//! constructors deep in a service can stamp it without threading it through
//! every call. Task-locals do not follow `spawn`; run spawned work through
//! [`TraceId::instrument`] to carry the id across.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

/// Header that carries the trace id on requests and responses.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static ACTIVE: TraceId;
}

/// UUID naming one request or one reconciliation sweep in logs and error
/// bodies.
///
/// # Examples
/// ```
/// use profile_registry::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let id = TraceId::generate();
/// let seen = id.instrument(async { TraceId::current() }).await;
/// assert_eq!(seen, Some(id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Fresh random (v4) id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id supplied by an upstream hop, when it is a well-formed UUID.
    ///
    /// Anything else is ignored so a caller cannot inject arbitrary text
    /// into logs or response headers.
    #[must_use]
    pub fn from_upstream(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| value.trim().parse().ok())
    }

    /// The id of the enclosing [`TraceId::instrument`] call, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE.try_with(|active| *active).ok()
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }

    /// Run `work` with this id as [`TraceId::current`].
    pub async fn instrument<F: Future>(self, work: F) -> F::Output {
        ACTIVE.scope(self, work).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}
