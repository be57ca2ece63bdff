//! Response handling and relaying.
//!
//! # Responsibilities
//! - Copy upstream headers to the client, minus the removed set
//! - Relay the upstream status and stream the body back
//! - Map dispatch failures to a 500 with the error's description
//!
//! # Design Decisions
//! - The removed-header set is built once and shared read-only
//! - Multi-valued headers keep every value
//! - Streaming responses avoid buffering the entire body

use std::collections::HashSet;

use axum::http::header::{HeaderMap, HeaderName, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::request::ForwardError;
use crate::http::stream;

/// Header names never copied from an upstream response to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedHeaders {
    names: HashSet<HeaderName>,
}

impl RemovedHeaders {
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator<Item = HeaderName>,
    {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Header names are compared case-insensitively.
    pub fn contains(&self, name: &HeaderName) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for RemovedHeaders {
    fn default() -> Self {
        Self::new([HeaderName::from_static("keep-alive")])
    }
}

/// Copy `upstream` headers, skipping any name in `removed`.
pub fn relay_headers(upstream: &HeaderMap, removed: &RemovedHeaders) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if removed.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Build the client response for an upstream response.
///
/// Headers and status are set up front; the body is pumped in a separate
/// task so the response can be returned to the connection immediately.
pub fn relay(upstream: reqwest::Response, removed: &RemovedHeaders) -> Response {
    let status = upstream.status();
    let headers = relay_headers(upstream.headers(), removed);

    let (writer, body) = stream::channel();
    tokio::spawn(stream::pump(upstream.bytes_stream(), writer));

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// 500 response describing a failed dispatch.
pub fn upstream_failure(error: &ForwardError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        error.describe(),
    )
        .into_response()
}
