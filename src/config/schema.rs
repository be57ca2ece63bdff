//! Configuration schema definitions.
//!
//! The resolved configuration is built once at startup and shared read-only
//! with every request task.

use std::fmt;

use axum::http::Uri;

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Local port to listen on. Kept exactly as parsed; the listener rejects
    /// values outside the `u16` range when it binds.
    pub listen_port: i64,

    /// The single upstream every request is forwarded to.
    pub upstream: Upstream,

    /// Inbound TLS settings.
    pub tls: TlsConfig,
}

/// Parsed upstream target.
///
/// Accepts anything [`Uri`] accepts: `scheme://host:port/...`, a bare
/// `host:port` authority, or a relative reference. Only the scheme and
/// authority are used when forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    uri: Uri,
}

impl Upstream {
    pub fn new(uri: Uri) -> Self {
        Self { uri }
    }

    /// Upstream scheme. A bare authority forwards over plain HTTP.
    pub fn scheme(&self) -> &str {
        self.uri.scheme_str().unwrap_or("http")
    }

    /// Upstream authority exactly as given (`example.com:9000`), or an empty
    /// string for a relative target.
    pub fn host(&self) -> &str {
        self.uri.authority().map(|a| a.as_str()).unwrap_or("")
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme(), self.host())
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// Serve HTTPS instead of plain HTTP.
    pub enabled: bool,

    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl TlsConfig {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn enabled(cert_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            enabled: true,
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}
