//! Clipboard persistence.
//!
//! Keeps the clipboard alive after its owner is gone: every new client
//! owner is snapshotted in the background, and when the clipboard becomes
//! empty a memory placeholder serving the snapshot takes over.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use sel_core::config::PersistenceConfig;
use sel_core::persistence::{ClipboardSnapshot, SnapshotPolicy};
use sel_core::ports::{DataSourceBackend, SourceStream};
use sel_core::{
    DataSource, MimeType, OwnerChanged, SelectionClass, SourceId, TransferError, WireProtocol,
};
use tracing::{debug, info, info_span, Instrument};

use crate::context::{SelectionContext, TaskCompletion};
use crate::transfer::{MemorySink, Transfer};

/// Source backend serving cached bytes. Notifications are ignored.
pub struct MemorySourceBackend {
    snapshot: ClipboardSnapshot,
}

impl MemorySourceBackend {
    pub fn new(snapshot: ClipboardSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl DataSourceBackend for MemorySourceBackend {
    async fn open(&self, mime_type: &MimeType) -> Result<SourceStream, TransferError> {
        if !self.snapshot.mime_type.matches(mime_type.as_str()) {
            return Err(TransferError::NotOffered(mime_type.clone()));
        }
        Ok(Box::new(std::io::Cursor::new(self.snapshot.bytes.clone())))
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}

/// Snapshot slot shared with the fetch task. A fetch only lands if the
/// generation it started under is still current.
#[derive(Debug, Default)]
struct SnapshotSlot {
    generation: u64,
    snapshot: Option<ClipboardSnapshot>,
}

pub struct ClipboardPersistence {
    enabled: bool,
    policy: SnapshotPolicy,
    slot: Arc<Mutex<SnapshotSlot>>,
    placeholder: Option<SourceId>,
}

impl ClipboardPersistence {
    pub fn new(config: &PersistenceConfig) -> Self {
        Self {
            enabled: config.enabled,
            policy: SnapshotPolicy::new(config),
            slot: Arc::default(),
            placeholder: None,
        }
    }

    pub fn snapshot(&self) -> Option<ClipboardSnapshot> {
        self.lock_slot().snapshot.clone()
    }

    pub fn placeholder(&self) -> Option<&SourceId> {
        self.placeholder.as_ref()
    }

    pub fn on_owner_changed(&mut self, ctx: &mut SelectionContext, change: &OwnerChanged) {
        if !self.enabled || change.class != SelectionClass::Clipboard {
            return;
        }
        match &change.owner {
            Some(owner) => self.owner_set(ctx, owner),
            None => self.owner_cleared(ctx),
        }
    }

    fn owner_set(&mut self, ctx: &mut SelectionContext, owner: &SourceId) {
        if self.placeholder.as_ref() == Some(owner) {
            return;
        }
        let Some(source) = ctx.sources.get(owner) else {
            return;
        };
        if source.is_placeholder() {
            return;
        }
        let target = self.policy.select(source.mimetypes());

        let generation = {
            let mut slot = self.lock_slot();
            slot.generation += 1;
            slot.snapshot = None;
            slot.generation
        };
        if let Some(placeholder) = self.placeholder.take() {
            ctx.destroy_source(&placeholder);
        }

        let Some(target) = target else {
            debug!(source = %owner, "no mimetype worth snapshotting");
            return;
        };

        let sink = MemorySink::new();
        let transfer = Transfer::from_source(
            ctx,
            Some(owner),
            target.mime_type.clone(),
            Some(target.max_bytes),
            sink.boxed(),
        );
        let slot = Arc::clone(&self.slot);
        let completions = ctx.completions.sender();
        let cancel = ctx.transfers.token();
        let span = info_span!(
            "selection.persistence.fetch",
            source = %owner,
            mime = %target.mime_type,
            max_bytes = target.max_bytes,
        );
        ctx.transfers.spawn_task(
            async move {
                if let Err(err) = transfer.run(cancel).await {
                    debug!(error = %err, "clipboard snapshot fetch failed");
                    return;
                }
                let bytes = sink.bytes();
                if bytes.is_empty() {
                    debug!("empty clipboard snapshot not cached");
                    return;
                }
                let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
                if slot.generation != generation {
                    debug!("clipboard owner changed during fetch, snapshot discarded");
                    return;
                }
                info!(bytes = bytes.len(), "clipboard snapshot cached");
                slot.snapshot = Some(ClipboardSnapshot::new(target.mime_type, bytes));
                let _ = completions.send(TaskCompletion::SnapshotCached);
            }
            .instrument(span),
        );
    }

    /// A snapshot fetch finished. If its owner is already gone the
    /// clipboard is empty and the placeholder takes over now.
    pub fn on_snapshot_cached(&mut self, ctx: &mut SelectionContext) {
        if !self.enabled || self.placeholder.is_some() {
            return;
        }
        if ctx.owner(SelectionClass::Clipboard).is_none() {
            debug!("snapshot landed after its owner left");
            self.owner_cleared(ctx);
        }
    }

    fn owner_cleared(&mut self, ctx: &mut SelectionContext) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };
        let id = SourceId::new();
        let mut placeholder = DataSource::new(
            id.clone(),
            None,
            WireProtocol::DataDevice,
            Arc::new(MemorySourceBackend::new(snapshot.clone())),
        );
        placeholder.add_mimetype(snapshot.mime_type.clone());
        ctx.sources.insert(placeholder);
        self.placeholder = Some(id.clone());

        info!(source = %id, mime = %snapshot.mime_type, "clipboard placeholder installed");
        ctx.set_owner(SelectionClass::Clipboard, &id);
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, SnapshotSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
