//! Single-upstream HTTP(S) reverse proxy.
//!
//! ```text
//! simple-reverse-proxy <local port> <upstream host:port | url> <true|false> [<cert path> <key path>]
//! ```
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                REVERSE PROXY                  │
//!    Client Request    │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!    ──────────────────┼─▶│   net    │──▶│  server  │──▶│ request  │──┼──▶ Upstream
//!                      │  │ TCP/TLS  │   │  (axum)  │   │ rewrite  │  │
//!                      │  └──────────┘   └──────────┘   └──────────┘  │
//!    Client Response   │  ┌──────────┐   ┌──────────┐                 │
//!    ◀─────────────────┼──│  stream  │◀──│ response │◀────────────────┼─── Upstream
//!                      │  │  +flush  │   │ headers  │                 │
//!                      │  └──────────┘   └──────────┘                 │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use simple_reverse_proxy::config;
use simple_reverse_proxy::lifecycle::{startup, Shutdown};
use simple_reverse_proxy::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    tracing::info!("simple-reverse-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match config::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        listen_port = config.listen_port,
        upstream = %config.upstream,
        https = config.tls.enabled,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    if let Err(e) = startup::start(config, &shutdown).await {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
