//! Request rewriting and forwarding.
//!
//! # Responsibilities
//! - Re-address an inbound request at the upstream (scheme, authority, Host)
//! - Record the caller in `X-Forwarded-For`
//! - Drop framing that only made sense on the inbound connection
//! - Dispatch the rewritten request with the shared client
//!
//! # Design Decisions
//! - Path, query, method, headers and body pass through untouched
//! - Request bodies are streamed, never buffered
//! - `X-Forwarded-For` is replaced rather than appended

use std::net::SocketAddr;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::uri::{PathAndQuery, Scheme};
use axum::http::{Request, Uri, Version};
use thiserror::Error;

use crate::config::Upstream;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Failure to get a response out of the upstream.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Upstream target has no host to send to.
    #[error("upstream target {0:?} has no host")]
    NoUpstreamHost(String),

    #[error("invalid upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    /// Transport failure talking to the upstream.
    #[error(transparent)]
    Upstream(#[from] reqwest::Error),
}

impl ForwardError {
    /// Human-readable description including every underlying cause.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = cause.source();
        }
        message
    }
}

/// Rewrite an inbound request so it addresses `upstream`.
pub fn rewrite(
    request: Request<Body>,
    upstream: &Upstream,
    client_addr: SocketAddr,
) -> Result<Request<Body>, ForwardError> {
    let authority = upstream
        .uri()
        .authority()
        .cloned()
        .ok_or_else(|| ForwardError::NoUpstreamHost(upstream.uri().to_string()))?;
    let scheme = upstream.uri().scheme().cloned().unwrap_or(Scheme::HTTP);

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = std::mem::take(&mut parts.uri).into_parts();
    uri_parts.scheme = Some(scheme);
    uri_parts.authority = Some(authority.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = Uri::from_parts(uri_parts).map_err(axum::http::Error::from)?;

    // Protocol version belongs to the inbound connection; the client
    // negotiates its own.
    parts.version = Version::default();

    let host = HeaderValue::from_str(authority.as_str()).map_err(axum::http::Error::from)?;
    parts.headers.insert(HOST, host);

    let forwarded_for = HeaderValue::from_str(&client_addr.ip().to_string())
        .map_err(axum::http::Error::from)?;
    parts.headers.insert(X_FORWARDED_FOR, forwarded_for);

    Ok(Request::from_parts(parts, body))
}

/// Send a rewritten request to the upstream.
pub async fn forward(
    client: &reqwest::Client,
    request: Request<Body>,
) -> Result<reqwest::Response, ForwardError> {
    let request = request.map(|body| {
        // Bodiless requests stay bodiless rather than becoming empty chunked streams.
        if body.is_end_stream() {
            reqwest::Body::from(Bytes::new())
        } else {
            reqwest::Body::wrap_stream(body.into_data_stream())
        }
    });
    let request = reqwest::Request::try_from(request)?;
    Ok(client.execute(request).await?)
}
