//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Config.listen_port
//!     → listener.rs (port check, bind)
//!     → tls.rs (PEM cert/key → rustls config, HTTPS only)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Every failure here is fatal at startup
//! - No connection limit; the OS bounds concurrency
//! - TLS is chosen once from config, independent of the upstream scheme

pub mod listener;
pub mod tls;

pub use listener::ListenerError;
