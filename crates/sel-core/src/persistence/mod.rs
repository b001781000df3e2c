//! Clipboard snapshot model and ranking policy.

mod policy;
mod snapshot;

pub use policy::{SnapshotKind, SnapshotPolicy, SnapshotTarget};
pub use snapshot::ClipboardSnapshot;
