//! Streaming response bodies with periodic flushing.
//!
//! # Responsibilities
//! - Expose the client response body as a sink with `write` and `flush`
//! - Copy the upstream body into that sink chunk by chunk
//! - Flush buffered bytes on a fixed interval while the copy runs
//!
//! # Design Decisions
//! - Written bytes sit in the writer until a flush hands them to the
//!   connection; the flusher makes slow upstreams visible progressively
//! - The flusher is scoped to the copy: stopped by a one-shot signal sent
//!   once the copy returns, then joined
//! - A client that goes away ends the copy at once, even while the upstream
//!   is idle, which drops the upstream body and releases its connection
//! - Once status and headers are sent nothing can be amended, so upstream
//!   failures only terminate the body early

use std::future::Future;
use std::io;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::BoxError;
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// How often buffered output is pushed to the client while a body streams.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Buffered bytes above which `write` flushes without waiting for a tick.
const MAX_BUFFERED: usize = 64 * 1024;

/// Frames queued between the writer and the connection.
const CHANNEL_CAPACITY: usize = 16;

type Frame = Result<Bytes, io::Error>;

/// The client connection has gone away.
#[derive(Debug, Error)]
#[error("client connection closed")]
pub struct SinkClosed;

/// A response body that can be written to and flushed.
pub trait BodySink: Send + Sync {
    /// Buffer a chunk for the client.
    fn write(&self, chunk: Bytes) -> impl Future<Output = Result<(), SinkClosed>> + Send;

    /// Hand everything buffered so far to the connection. A no-op when
    /// nothing is pending, unless the client is already gone.
    fn flush(&self) -> impl Future<Output = Result<(), SinkClosed>> + Send;

    /// Resolves once the client can no longer receive anything.
    fn closed(&self) -> impl Future<Output = ()> + Send;
}

/// Error from copying an upstream body into a [`BodySink`].
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("upstream body failed: {0}")]
    Upstream(BoxError),

    #[error(transparent)]
    Client(#[from] SinkClosed),
}

/// Buffering writer backed by the channel that feeds the client body.
#[derive(Debug)]
pub struct FlushingWriter {
    state: Mutex<WriterState>,
    // Watched without taking the state lock.
    watch: mpsc::Sender<Frame>,
}

#[derive(Debug)]
struct WriterState {
    pending: Vec<Bytes>,
    pending_len: usize,
    tx: mpsc::Sender<Frame>,
}

/// Create a writer and the client body it feeds.
pub fn channel() -> (FlushingWriter, Body) {
    let (tx, rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let frames = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (frame, rx))
    });

    let writer = FlushingWriter {
        watch: tx.clone(),
        state: Mutex::new(WriterState {
            pending: Vec::new(),
            pending_len: 0,
            tx,
        }),
    };
    (writer, Body::from_stream(frames))
}

impl FlushingWriter {
    /// Terminate the client body with an error after delivering what is
    /// buffered. The client sees a truncated response.
    pub async fn abort(self, error: io::Error) {
        let FlushingWriter { state, .. } = self;
        let mut state = state.into_inner();
        let _ = state.flush().await;
        let _ = state.tx.send(Err(error)).await;
    }
}

impl WriterState {
    async fn flush(&mut self) -> Result<(), SinkClosed> {
        if self.pending.is_empty() {
            return if self.tx.is_closed() { Err(SinkClosed) } else { Ok(()) };
        }
        self.pending_len = 0;
        for chunk in self.pending.drain(..) {
            self.tx.send(Ok(chunk)).await.map_err(|_| SinkClosed)?;
        }
        Ok(())
    }
}

impl BodySink for FlushingWriter {
    async fn write(&self, chunk: Bytes) -> Result<(), SinkClosed> {
        let mut state = self.state.lock().await;
        if state.tx.is_closed() {
            return Err(SinkClosed);
        }
        if chunk.is_empty() {
            return Ok(());
        }
        state.pending_len += chunk.len();
        state.pending.push(chunk);
        if state.pending_len >= MAX_BUFFERED {
            state.flush().await?;
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkClosed> {
        self.state.lock().await.flush().await
    }

    async fn closed(&self) {
        self.watch.closed().await
    }
}

/// Copy `body` into `sink` until the upstream ends, then flush.
///
/// Returns the number of bytes copied.
pub async fn copy<St, E, S>(body: St, sink: &S) -> Result<u64, CopyError>
where
    St: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
    S: BodySink,
{
    let mut body = std::pin::pin!(body);
    let mut copied = 0u64;
    while let Some(next) = body.next().await {
        match next {
            Ok(chunk) => {
                copied += chunk.len() as u64;
                sink.write(chunk).await?;
            }
            Err(e) => {
                let _ = sink.flush().await;
                return Err(CopyError::Upstream(e.into()));
            }
        }
    }
    sink.flush().await?;
    Ok(copied)
}

/// Copy `body` into `sink` while a flusher runs every `period`.
///
/// The flusher is stopped exactly once, as soon as the copy returns, and is
/// joined before this function returns. The copy is abandoned, and `body`
/// dropped, as soon as the sink reports the client closed.
pub async fn copy_with_flush<St, E, S>(body: St, sink: &S, period: Duration) -> Result<u64, CopyError>
where
    St: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
    S: BodySink,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let copying = async move {
        let result = tokio::select! {
            result = copy(body, sink) => result,
            () = sink.closed() => Err(CopyError::Client(SinkClosed)),
        };
        let _ = stop_tx.send(());
        result
    };

    let (result, ()) = tokio::join!(copying, flush_periodically(sink, period, stop_rx));
    result
}

async fn flush_periodically<S: BodySink>(sink: &S, period: Duration, mut stop: oneshot::Receiver<()>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => return,
            _ = ticker.tick() => {
                if sink.flush().await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Stream an upstream body to the client through `writer`.
///
/// Runs as its own task per response; finishes when the upstream body ends,
/// the upstream fails, or the client goes away.
pub async fn pump<St, E>(body: St, writer: FlushingWriter)
where
    St: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    match copy_with_flush(body, &writer, FLUSH_INTERVAL).await {
        Ok(bytes) => {
            tracing::trace!(bytes, "Response body streamed");
        }
        Err(CopyError::Upstream(e)) => {
            tracing::debug!(error = %e, "Upstream body ended early");
            writer.abort(io::Error::other(e)).await;
        }
        Err(CopyError::Client(e)) => {
            tracing::debug!(error = %e, "Client went away mid-stream");
        }
    }
}
