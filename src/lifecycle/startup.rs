//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the proxy from the resolved configuration
//! - Bind the listener, then load TLS material when HTTPS is on
//! - Serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::path::Path;

use crate::config::Config;
use crate::http::{ProxyServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::net::{listener, tls};

/// Start serving `config` until `shutdown` fires.
pub async fn start(config: Config, shutdown: &Shutdown) -> Result<(), ServerError> {
    let server = ProxyServer::new(config)?;
    let listener = listener::bind(server.config().listen_port).await?;

    if server.config().tls.enabled {
        let tls = &server.config().tls;
        let rustls = tls::load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
        server.run_tls(listener, rustls, shutdown.subscribe()).await
    } else {
        server.run(listener, shutdown.subscribe()).await
    }
}
