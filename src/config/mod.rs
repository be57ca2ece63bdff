//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! positional CLI arguments
//!     → loader.rs (argument count, ordering, TLS paths)
//!     → validation.rs (port, boolean, upstream URI)
//!     → Config (validated, immutable)
//!     → shared via Arc with every request task
//! ```
//!
//! # Design Decisions
//! - Resolution is a pure function; nothing touches the file system
//! - Config is immutable once resolved
//! - Port range is enforced by the listener, not here

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve, ConfigError};
pub use schema::{Config, TlsConfig, Upstream};
