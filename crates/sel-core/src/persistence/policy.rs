use std::cmp::Ordering;

use crate::config::PersistenceConfig;
use crate::selection::MimeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Image,
    Text,
}

/// Snapshot candidates, most specific first.
const RANKED_MIME_TYPES: &[(&str, SnapshotKind)] = &[
    ("image/jp2", SnapshotKind::Image),
    ("image/jpeg", SnapshotKind::Image),
    ("image/bmp", SnapshotKind::Image),
    ("image/x-bmp", SnapshotKind::Image),
    ("image/x-ms-bmp", SnapshotKind::Image),
    ("image/x-icon", SnapshotKind::Image),
    ("image/x-ico", SnapshotKind::Image),
    ("image/vnd.microsoft.icon", SnapshotKind::Image),
    ("image/png", SnapshotKind::Image),
    ("image/tiff", SnapshotKind::Image),
    ("text/plain;charset=utf-8", SnapshotKind::Text),
    ("text/plain", SnapshotKind::Text),
];

/// Mimetype to fetch for a snapshot, with its size cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotTarget {
    pub mime_type: MimeType,
    pub kind: SnapshotKind,
    pub max_bytes: u64,
}

/// Picks the single mimetype worth snapshotting.
///
/// - rank by position in a fixed table; unknown types are never picked
/// - stable: on equal rank the owner's advertised order wins
#[derive(Debug, Clone)]
pub struct SnapshotPolicy {
    max_text_bytes: u64,
    max_image_bytes: u64,
}

impl SnapshotPolicy {
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            max_text_bytes: config.max_text_bytes,
            max_image_bytes: config.max_image_bytes,
        }
    }

    fn rank(mime_type: &MimeType) -> Option<(usize, SnapshotKind)> {
        RANKED_MIME_TYPES
            .iter()
            .position(|(known, _)| mime_type.matches(known))
            .map(|index| (index, RANKED_MIME_TYPES[index].1))
    }

    fn cap(&self, kind: SnapshotKind) -> u64 {
        match kind {
            SnapshotKind::Image => self.max_image_bytes,
            SnapshotKind::Text => self.max_text_bytes,
        }
    }

    pub fn select(&self, mime_types: &[MimeType]) -> Option<SnapshotTarget> {
        let mut ranked: Vec<(usize, usize, SnapshotKind)> = mime_types
            .iter()
            .enumerate()
            .filter_map(|(order, mime)| Self::rank(mime).map(|(rank, kind)| (rank, order, kind)))
            .collect();

        ranked.sort_by(|a, b| match a.0.cmp(&b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            ord => ord,
        });

        ranked.first().map(|&(_, order, kind)| SnapshotTarget {
            mime_type: mime_types[order].clone(),
            kind,
            max_bytes: self.cap(kind),
        })
    }
}
