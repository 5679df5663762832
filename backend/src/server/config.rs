//! HTTP server configuration.

use std::net::SocketAddr;

use crate::inbound::http::state::HttpState;

/// Listener address and handler dependencies for [`super::create_server`].
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: HttpState,
}

impl ServerConfig {
    /// Bundle the listen address with the handler state.
    #[must_use]
    pub const fn new(bind_addr: SocketAddr, http_state: HttpState) -> Self {
        Self {
            bind_addr,
            http_state,
        }
    }

    /// Address the server binds to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
