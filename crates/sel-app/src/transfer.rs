//! Transfer pipeline.
//!
//! One transfer is one async task copying a source stream into a sink, in
//! chunks, with an optional byte cap. Cancellation is checked at every
//! suspension point and the sink is shut down on every exit path.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context as TaskContext, Poll};

use bytes::Bytes;
use sel_core::ports::{DataSourceBackend, TransferSink};
use sel_core::{MimeType, SelectionClass, SourceId, TransferError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn, Instrument, Span};

use crate::context::SelectionContext;

type Origin = Result<(Arc<dyn DataSourceBackend>, MimeType), TransferError>;

/// A single source → sink copy, resolved and ready to run.
pub struct Transfer {
    origin: Origin,
    max_bytes: Option<u64>,
    chunk_size: usize,
    sink: TransferSink,
}

impl Transfer {
    /// Read from whoever owns `class` right now.
    pub fn for_selection(
        ctx: &SelectionContext,
        class: SelectionClass,
        mime_type: MimeType,
        max_bytes: Option<u64>,
        sink: TransferSink,
    ) -> Self {
        let origin = match ctx.registry.owner(class).and_then(|id| ctx.sources.get(id)) {
            None => Err(TransferError::NoOwner(class)),
            Some(source) => source
                .read(&mime_type)
                .map_err(|_| TransferError::Rejected(mime_type.clone()))
                .map(|backend| (backend, mime_type)),
        };
        Self::with_origin(ctx, origin, max_bytes, sink)
    }

    /// Read from one fixed source. A missing source is `Unavailable`.
    pub fn from_source(
        ctx: &SelectionContext,
        source: Option<&SourceId>,
        mime_type: MimeType,
        max_bytes: Option<u64>,
        sink: TransferSink,
    ) -> Self {
        let origin = match source.and_then(|id| ctx.sources.get(id)) {
            None => Err(TransferError::Unavailable),
            Some(source) => source
                .read(&mime_type)
                .map(|backend| (backend, mime_type)),
        };
        Self::with_origin(ctx, origin, max_bytes, sink)
    }

    /// A transfer that only closes its sink and reports `Unavailable`.
    pub fn unavailable(ctx: &SelectionContext, sink: TransferSink) -> Self {
        Self::with_origin(ctx, Err(TransferError::Unavailable), None, sink)
    }

    fn with_origin(
        ctx: &SelectionContext,
        origin: Origin,
        max_bytes: Option<u64>,
        sink: TransferSink,
    ) -> Self {
        Self {
            origin,
            max_bytes,
            chunk_size: ctx.config.transfer.chunk_size,
            sink,
        }
    }

    /// Copy to completion, cap, first error or cancellation.
    ///
    /// Returns the number of bytes written.
    pub async fn run(self, cancel: CancellationToken) -> Result<u64, TransferError> {
        let Transfer {
            origin,
            max_bytes,
            chunk_size,
            mut sink,
        } = self;

        let copied: Result<u64, TransferError> = async {
            let (backend, mime_type) = origin?;
            let mut stream = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TransferError::Cancelled),
                opened = backend.open(&mime_type) => opened?,
            };
            copy_chunks(&mut stream, &mut sink, max_bytes, chunk_size, &cancel).await
        }
        .await;

        let closed = sink.shutdown().await;
        match (copied, closed) {
            (Ok(written), Ok(())) => Ok(written),
            (Ok(_), Err(err)) => Err(TransferError::Io(err)),
            (Err(err), _) => Err(err),
        }
    }
}

async fn copy_chunks<R, W>(
    stream: &mut R,
    sink: &mut W,
    max_bytes: Option<u64>,
    chunk_size: usize,
    cancel: &CancellationToken,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut written: u64 = 0;

    loop {
        let want = match max_bytes {
            Some(limit) => {
                let remaining = limit.saturating_sub(written);
                if remaining == 0 {
                    break;
                }
                remaining.min(buf.len() as u64) as usize
            }
            None => buf.len(),
        };

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            read = stream.read(&mut buf[..want]) => read?,
        };
        if read == 0 {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransferError::Cancelled),
            res = sink.write_all(&buf[..read]) => res?,
        }
        written += read as u64;
    }

    Ok(written)
}

/// Spawns transfers onto the runtime and tracks them for shutdown.
#[derive(Clone, Default)]
pub struct TransferRunner {
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl TransferRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a Tokio runtime.
    pub fn spawn(&self, transfer: Transfer, span: Span) -> JoinHandle<Result<u64, TransferError>> {
        let cancel = self.token();
        self.tracker.spawn(
            async move {
                let result = transfer.run(cancel).await;
                match &result {
                    Ok(written) => debug!(bytes = written, "transfer complete"),
                    Err(TransferError::Cancelled) => debug!("transfer cancelled"),
                    Err(err) => warn!(error = %err, "transfer failed"),
                }
                result
            }
            .instrument(span),
        )
    }

    /// Track an arbitrary follow-up task (snapshot fetch, desktop drop).
    pub fn spawn_task<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Token cancelled by [`TransferRunner::cancel_all`].
    pub fn token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Wait until every tracked task finished.
    pub async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub fn cancel_all(&self) {
        self.cancel.cancel();
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

#[derive(Debug, Default)]
struct MemoryBuffer {
    bytes: Vec<u8>,
    closed: bool,
}

/// Growable in-memory sink. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<MemoryBuffer>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> Bytes {
        let buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Bytes::copy_from_slice(&buffer.bytes)
    }

    pub fn is_closed(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    pub fn boxed(&self) -> TransferSink {
        Box::new(self.clone())
    }
}

impl AsyncWrite for MemorySink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut TaskContext<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut buffer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if buffer.closed {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory sink closed",
            )));
        }
        buffer.bytes.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
        Poll::Ready(Ok(()))
    }
}
