//! Service entry-point: loads settings, connects stores and serves HTTP.

use std::io;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use profile_registry::domain::StorageRetry;
use profile_registry::inbound::http::health::HealthState;
use profile_registry::server::{
    ServerConfig, StoragePorts, build_http_state, build_reconciler, create_server, drain_on,
    shutdown_signal, spawn_reconciler,
};
use profile_registry::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load().map_err(|err| io::Error::other(format!("invalid configuration: {err}")))?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    let ports = StoragePorts::connect(&settings)
        .await
        .map_err(|err| io::Error::other(format!("storage start-up failed: {err}")))?;
    let retry = StorageRetry::new(settings.retry_policy());

    if let Some(interval) = settings.reconcile_interval() {
        spawn_reconciler(build_reconciler(&ports, &retry), interval);
    }

    let http_state = build_http_state(&ports, &retry, settings.upload_limits());
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), ServerConfig::new(bind_addr, http_state))?;
    drain_on(health_state, server.handle(), shutdown_signal());

    info!(%bind_addr, "profile registry listening");
    server.await
}
