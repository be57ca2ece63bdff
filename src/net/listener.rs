//! TCP listener binding.
//!
//! # Responsibilities
//! - Turn the configured port into a socket address
//! - Bind the plain TCP listener
//! - Report bind failures as fatal startup errors

use std::net::{Ipv4Addr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Port is outside the range a socket can bind.
    #[error("Invalid port {0}: must be between 0 and 65535")]
    InvalidPort(i64),

    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key could not be loaded.
    #[error("Failed to load TLS material: {0}")]
    Tls(#[source] std::io::Error),
}

/// Address the proxy listens on for a given port: all IPv4 interfaces.
pub fn listen_addr(port: i64) -> Result<SocketAddr, ListenerError> {
    let port = u16::try_from(port).map_err(|_| ListenerError::InvalidPort(port))?;
    Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
}

/// Bind a plain TCP listener on the configured port.
pub async fn bind(port: i64) -> Result<TcpListener, ListenerError> {
    let addr = listen_addr(port)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;

    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!(address = %local_addr, "Listener bound");
    }

    Ok(listener)
}
