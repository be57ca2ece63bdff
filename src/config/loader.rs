//! Configuration resolution from positional startup arguments.

use thiserror::Error;

use crate::config::schema::{Config, TlsConfig, Upstream};
use crate::config::validation::{parse_bool, parse_port, parse_upstream};

/// Error type for configuration resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("You need to provide <local port> <proxy host:port> <true|false> (https)")]
    MissingArguments,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid boolean value for https")]
    InvalidBoolean,

    #[error("You need to provide <local port> <proxy host:port> <true|false> (https) <cert path> <key path>")]
    MissingHttpsArguments,

    /// Upstream target did not parse; carries the parser's message.
    #[error("{0}")]
    InvalidUpstreamUrl(String),
}

/// Resolve `<local port> <upstream> <true|false> [<cert path> <key path>]`.
///
/// Arguments are checked in order: count, port, https flag, upstream, then
/// the TLS paths. No file system access happens here.
pub fn resolve<S: AsRef<str>>(args: &[S]) -> Result<Config, ConfigError> {
    if args.len() < 3 {
        return Err(ConfigError::MissingArguments);
    }

    let listen_port = parse_port(args[0].as_ref())?;
    let https = parse_bool(args[2].as_ref())?;
    let upstream = Upstream::new(parse_upstream(args[1].as_ref())?);
    let tls = resolve_tls(https, args)?;

    Ok(Config {
        listen_port,
        upstream,
        tls,
    })
}

fn resolve_tls<S: AsRef<str>>(https: bool, args: &[S]) -> Result<TlsConfig, ConfigError> {
    if !https {
        return Ok(TlsConfig::disabled());
    }
    if args.len() < 5 {
        return Err(ConfigError::MissingHttpsArguments);
    }
    Ok(TlsConfig::enabled(args[3].as_ref(), args[4].as_ref()))
}
