use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::TransferError;
use crate::ids::{ClientId, SourceId};
use crate::selection::{DndAction, MimeType};

/// Byte stream produced by a source for one mimetype.
pub type SourceStream = Box<dyn AsyncRead + Send + Unpin>;

/// Destination of a transfer, handed in by the requesting client.
pub type TransferSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Behavior behind a [`DataSource`](crate::source::DataSource).
///
/// Two implementations exist: one forwarding to the owning client over the
/// wire, and the memory placeholder installed by clipboard persistence.
/// Notification hooks default to no-ops.
#[async_trait]
pub trait DataSourceBackend: Send + Sync {
    /// Ask the owner to produce bytes for `mime_type`.
    async fn open(&self, mime_type: &MimeType) -> Result<SourceStream, TransferError>;

    /// Destination accepted `mime_type`, or stopped accepting with `None`.
    fn target(&self, _mime_type: Option<MimeType>) {}

    /// Loss of selection, or a failed drag.
    fn cancelled(&self) {}

    /// Negotiated drag-and-drop action changed.
    fn action(&self, _action: DndAction) {}

    fn drop_performed(&self) {}

    fn finished(&self) {}

    /// Memory-backed placeholders are never snapshotted again and may be
    /// active in more than one class.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// Transport side of a client-owned source: request a byte stream from the
/// owning client for one mimetype.
#[async_trait]
pub trait SourceStreamPort: Send + Sync {
    async fn request_stream(
        &self,
        client: &ClientId,
        source: &SourceId,
        mime_type: &MimeType,
    ) -> Result<SourceStream, TransferError>;
}
