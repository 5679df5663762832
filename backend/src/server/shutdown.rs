//! Graceful drain on interrupt or termination.
//!
//! The health checks flip to 503 before the listener closes, so a load balancer
//! stops routing to the instance while in-flight registrations finish.

use std::future::Future;
use std::io;

use actix_web::dev::ServerHandle;
use actix_web::rt::task::JoinHandle;
use actix_web::web;
use tracing::{info, warn};

use crate::inbound::http::health::HealthState;

/// Resolve on Ctrl-C, or on `SIGTERM` where the platform has one.
///
/// # Errors
///
/// Propagates [`io::Error`] when a signal handler cannot be installed.
pub async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

/// Wait for `trigger`, mark the service unhealthy, then stop the server once
/// in-flight requests complete.
///
/// A trigger that fails leaves the server running; it can still be stopped
/// by other means.
pub fn drain_on<F>(health_state: web::Data<HealthState>, server: ServerHandle, trigger: F) -> JoinHandle<()>
where
    F: Future<Output = io::Result<()>> + 'static,
{
    actix_web::rt::spawn(async move {
        if let Err(err) = trigger.await {
            warn!(error = %err, "shutdown signal unavailable; drain disabled");
            return;
        }
        info!("shutdown requested; draining in-flight requests");
        health_state.mark_unhealthy();
        server.stop(true).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use actix_web::{App, HttpServer};
    use rstest::rstest;

    #[rstest]
    #[actix_web::test]
    async fn trigger_fails_health_checks_and_stops_the_server() {
        let health = web::Data::new(HealthState::new());
        let server = HttpServer::new(App::new)
            .disable_signals()
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("bind ephemeral port")
            .run();
        health.mark_ready();

        drain_on(health.clone(), server.handle(), async { Ok(()) });
        server.await.expect("server stops cleanly");

        assert!(!health.is_alive());
        assert!(!health.is_ready());
    }

    #[rstest]
    #[actix_web::test]
    async fn failed_trigger_keeps_the_service_healthy() {
        let health = web::Data::new(HealthState::new());
        health.mark_ready();
        let server = HttpServer::new(App::new)
            .disable_signals()
            .workers(1)
            .bind(("127.0.0.1", 0))
            .expect("bind ephemeral port")
            .run();
        let handle = server.handle();
        let stopper = actix_web::rt::spawn(server);

        drain_on(health.clone(), handle.clone(), async {
            Err(io::Error::other("no signal support"))
        })
        .await
        .expect("drain task completes");

        assert!(health.is_alive());
        assert!(health.is_ready());
        handle.stop(false).await;
        stopper
            .await
            .expect("server task joins")
            .expect("server stops cleanly");
    }
}
