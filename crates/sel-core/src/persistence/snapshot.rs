use bytes::Bytes;

use crate::selection::MimeType;

/// Bytes of one clipboard mimetype kept in memory after the owner is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardSnapshot {
    pub mime_type: MimeType,
    pub bytes: Bytes,
}

impl ClipboardSnapshot {
    pub fn new(mime_type: MimeType, bytes: Bytes) -> Self {
        Self { mime_type, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
