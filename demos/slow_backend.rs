//! Upstream that trickles its response out, for watching the proxy flush.
//!
//! ```text
//! cargo run --example slow_backend
//! cargo run -- 8080 127.0.0.1:8081 false
//! curl -N http://127.0.0.1:8080/
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{body::Body, http::header, response::IntoResponse, routing::get, Router};

async fn trickle() -> impl IntoResponse {
    let ticks = futures_util::stream::unfold(0u32, |n| async move {
        if n == 10 {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
        Some((Ok::<_, Infallible>(format!("tick {n}\n")), n + 1))
    });

    (
        [(header::CONTENT_TYPE, "text/plain"), (header::HeaderName::from_static("keep-alive"), "timeout=5")],
        Body::from_stream(ticks),
    )
}

#[tokio::main]
async fn main() {
    let app = Router::new().route("/", get(trickle));

    let addr = SocketAddr::from(([127, 0, 0, 1], 8081));
    println!("Slow backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
