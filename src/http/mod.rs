//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, catch-all route)
//!     → request.rs (rewrite for the upstream, X-Forwarded-For, dispatch)
//!     → response.rs (filter headers, relay status)
//!     → stream.rs (copy body, flush every 10ms)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod stream;

pub use response::RemovedHeaders;
pub use server::{ProxyServer, ServerError};
