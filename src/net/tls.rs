//! TLS configuration and certificate loading.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::net::listener::ListenerError;

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, ListenerError> {
    if !cert_path.exists() {
        return Err(ListenerError::Tls(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Certificate file not found: {:?}", cert_path),
        )));
    }
    if !key_path.exists() {
        return Err(ListenerError::Tls(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Private key file not found: {:?}", key_path),
        )));
    }

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(ListenerError::Tls)?;

    tracing::info!(cert = ?cert_path, key = ?key_path, "TLS material loaded");
    Ok(config)
}
