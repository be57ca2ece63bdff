//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields
//!     → tower-http TraceLayer spans per request
//!
//! Consumers:
//!     → logging.rs (fmt subscriber on stdout, filtered by RUST_LOG)
//! ```

pub mod logging;
