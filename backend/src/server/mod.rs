//! Server construction and middleware wiring.

mod config;
mod reconcile_task;
mod shutdown;
mod state_builders;

pub use config::ServerConfig;
pub use reconcile_task::{spawn_reconciler, sweep_once};
pub use shutdown::{drain_on, shutdown_signal};
pub use state_builders::{
    StartupError, StoragePorts, build_http_state, build_reconciler,
};

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{get_profile_picture, get_user, list_users, register};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Assemble the application: trace middleware, user endpoints and health
/// checks, plus Swagger UI in debug builds.
#[must_use]
pub fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let routes = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(register)
        .service(list_users)
        .service(get_profile_picture)
        .service(get_user)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = routes.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = routes;

    app
}

/// Bind the HTTP server and mark the service ready.
///
/// Actix's own signal handling is disabled; pair the returned server with
/// [`drain_on`] so the health checks fail before the listener closes.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        http_state,
    } = config;
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .disable_signals()
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}
