//! Argument validation.
//!
//! Each check is a pure function over one raw argument. Port values are only
//! required to be integers; range enforcement belongs to the listener.

use axum::http::Uri;

use crate::config::loader::ConfigError;

/// Parse the local port as a base-10 integer.
pub fn parse_port(raw: &str) -> Result<i64, ConfigError> {
    raw.parse::<i64>().map_err(|_| ConfigError::InvalidPort)
}

/// Parse the HTTPS switch using the conventional boolean spellings.
pub fn parse_bool(raw: &str) -> Result<bool, ConfigError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean),
    }
}

/// Parse the upstream target, surfacing the parser's own message.
pub fn parse_upstream(raw: &str) -> Result<Uri, ConfigError> {
    raw.parse::<Uri>()
        .map_err(|e| ConfigError::InvalidUpstreamUrl(e.to_string()))
}
