use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use sel_core::ports::{SourceStream, SourceStreamPort};
use sel_core::{ClientId, MimeType, SourceId, TransferError};
use tracing::debug;

/// Plays the source clients: payloads are registered per source and
/// mimetype, and served as in-memory streams.
#[derive(Debug, Default)]
pub struct InMemorySourceStreams {
    payloads: Mutex<HashMap<(SourceId, MimeType), Bytes>>,
    requests: Mutex<Vec<(ClientId, SourceId, MimeType)>>,
}

impl InMemorySourceStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, source: &SourceId, mime_type: MimeType, payload: impl Into<Bytes>) {
        self.payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((source.clone(), mime_type), payload.into());
    }

    /// Every stream request received so far, in order.
    pub fn requests(&self) -> Vec<(ClientId, SourceId, MimeType)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SourceStreamPort for InMemorySourceStreams {
    async fn request_stream(
        &self,
        client: &ClientId,
        source: &SourceId,
        mime_type: &MimeType,
    ) -> Result<SourceStream, TransferError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((client.clone(), source.clone(), mime_type.clone()));

        let payload = self
            .payloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(source.clone(), mime_type.clone()))
            .cloned();
        match payload {
            Some(bytes) => Ok(Box::new(std::io::Cursor::new(bytes))),
            None => {
                debug!(%source, mime = %mime_type, "no payload registered");
                Err(TransferError::Unavailable)
            }
        }
    }
}
