//! Per-request correlation and access logging.
//!
//! Every request runs inside [`TraceId::instrument`]. The id is taken from an
//! inbound `trace-id` header when that holds a UUID, otherwise generated, and
//! is echoed on the response so clients can quote it.

use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{info, warn};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Middleware factory installing [`TraceId`] correlation on an `App`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use profile_registry::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware {
            inner: Rc::new(service),
        }))
    }
}

/// Wrapped service produced by [`Trace`].
pub struct TraceMiddleware<S> {
    inner: Rc<S>,
}

/// What the access log line needs once the response is ready.
struct RequestLine {
    method: String,
    path: String,
    started: Instant,
}

impl RequestLine {
    fn capture(req: &ServiceRequest) -> Self {
        Self {
            method: req.method().as_str().to_owned(),
            path: req.path().to_owned(),
            started: Instant::now(),
        }
    }

    fn log(&self, trace_id: TraceId, status: u16) {
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if status >= 500 {
            warn!(%trace_id, method = %self.method, path = %self.path, status, elapsed_ms, "request failed");
        } else {
            info!(%trace_id, method = %self.method, path = %self.path, status, elapsed_ms, "request completed");
        }
    }
}

fn trace_id_for(req: &ServiceRequest) -> TraceId {
    let upstream = req
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok());
    TraceId::from_upstream(upstream).unwrap_or_else(TraceId::generate)
}

fn echo_header<B>(res: &mut ServiceResponse<B>, trace_id: TraceId) {
    // A hyphenated UUID is always a valid header value.
    if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
        res.headers_mut()
            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
    }
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let trace_id = trace_id_for(&req);
        let line = RequestLine::capture(&req);
        let inner = Rc::clone(&self.inner);
        Box::pin(trace_id.instrument(async move {
            let mut res = inner.call(req).await?;
            echo_header(&mut res, trace_id);
            line.log(trace_id, res.status().as_u16());
            Ok(res)
        }))
    }
}
