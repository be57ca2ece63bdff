//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all proxy route
//! - Wire up request tracing
//! - Serve over plain TCP or TLS, with graceful shutdown
//! - Rewrite, forward and relay every request to the upstream

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::http::request::{forward, rewrite};
use crate::http::response::{relay, upstream_failure, RemovedHeaders};
use crate::net::ListenerError;

/// Error type for running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
///
/// Everything here is built before the first request and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub removed_headers: Arc<RemovedHeaders>,
    pub client: reqwest::Client,
}

/// HTTP server for the reverse proxy.
pub struct ProxyServer {
    router: Router,
    config: Arc<Config>,
}

impl ProxyServer {
    /// Create a server that strips the default removed-header set.
    pub fn new(config: Config) -> Result<Self, ServerError> {
        Self::with_removed_headers(config, RemovedHeaders::default())
    }

    pub fn with_removed_headers(config: Config, removed_headers: RemovedHeaders) -> Result<Self, ServerError> {
        let config = Arc::new(config);
        let state = AppState {
            config: config.clone(),
            removed_headers: Arc::new(removed_headers),
            client: upstream_client()?,
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The proxy router, for serving it through another stack.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serve plain HTTP on an already bound listener.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, upstream = %self.config.upstream, "HTTP proxy starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP proxy stopped");
        Ok(())
    }

    /// Serve HTTPS on an already bound listener.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, upstream = %self.config.upstream, "HTTPS proxy starting");

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            shutdown_handle.graceful_shutdown(None);
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS proxy stopped");
        Ok(())
    }
}

/// Client used for every upstream call.
///
/// Default timeouts and pooling. Where the request goes is decided by the
/// upstream URL alone, so environment proxies are ignored, and redirects are
/// handed back to the caller instead of being followed.
fn upstream_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Main proxy handler.
/// Rewrites the request for the upstream, forwards it and streams back the
/// response.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    tracing::debug!(
        client = %client_addr,
        method = %request.method(),
        uri = %request.uri(),
        "Proxying request"
    );

    let outbound = match rewrite(request, &state.config.upstream, client_addr) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(error = %e, "Cannot address upstream");
            return upstream_failure(&e);
        }
    };

    match forward(&state.client, outbound).await {
        Ok(upstream) => {
            tracing::debug!(status = %upstream.status(), "Upstream responded");
            relay(upstream, &state.removed_headers)
        }
        Err(e) => {
            tracing::error!(error = %e.describe(), "Upstream error");
            upstream_failure(&e)
        }
    }
}
