//! Single-upstream HTTP(S) reverse proxy library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::{resolve, Config, ConfigError};
pub use http::{ProxyServer, RemovedHeaders};
pub use lifecycle::Shutdown;
