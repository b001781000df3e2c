//! Explicit session context.
//!
//! Everything the protocol devices share lives here and is passed down as
//! `&mut SelectionContext`; there are no globals.

use std::sync::Arc;

use sel_core::ports::{
    ClientEventPort, GrabPort, KeyboardFocusPort, SourceStreamPort, VisualLayerPort,
};
use sel_core::{
    DataSource, MimeType, OfferStore, SelectionClass, SelectionRegistry, SessionConfig, SourceId,
    SourceStore,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::transfer::TransferRunner;

/// Outside collaborators of a session.
#[derive(Clone)]
pub struct SessionPorts {
    pub events: Arc<dyn ClientEventPort>,
    pub streams: Arc<dyn SourceStreamPort>,
    pub focus: Arc<dyn KeyboardFocusPort>,
    pub grab: Arc<dyn GrabPort>,
    pub visual: Arc<dyn VisualLayerPort>,
}

/// Outcome of a background task that must touch session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCompletion {
    /// A desktop drop drained its source.
    DesktopDropFinished(SourceId),
    DesktopDropFailed(SourceId),
    /// A clipboard snapshot landed in the persistence slot.
    SnapshotCached,
}

/// Completions posted by spawned tasks, applied by the session on its own
/// task the next time it pumps.
pub struct CompletionQueue {
    tx: mpsc::UnboundedSender<TaskCompletion>,
    rx: mpsc::UnboundedReceiver<TaskCompletion>,
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<TaskCompletion> {
        self.tx.clone()
    }

    pub fn try_next(&mut self) -> Option<TaskCompletion> {
        self.rx.try_recv().ok()
    }
}

pub struct SelectionContext {
    pub registry: SelectionRegistry,
    pub sources: SourceStore,
    pub offers: OfferStore,
    pub ports: SessionPorts,
    pub config: SessionConfig,
    pub transfers: TransferRunner,
    pub completions: CompletionQueue,
}

impl SelectionContext {
    pub fn new(ports: SessionPorts, config: SessionConfig) -> Self {
        Self {
            registry: SelectionRegistry::new(),
            sources: SourceStore::new(),
            offers: OfferStore::new(),
            ports,
            config,
            transfers: TransferRunner::new(),
            completions: CompletionQueue::new(),
        }
    }

    pub fn set_owner(&mut self, class: SelectionClass, source: &SourceId) -> bool {
        self.registry.set_owner(&mut self.sources, class, source)
    }

    pub fn unset_owner(&mut self, class: SelectionClass, source: &SourceId) -> bool {
        self.registry.unset_owner(&mut self.sources, class, source)
    }

    pub fn owner(&self, class: SelectionClass) -> Option<&SourceId> {
        self.registry.owner(class)
    }

    pub fn owner_source(&self, class: SelectionClass) -> Option<&DataSource> {
        self.owner(class).and_then(|id| self.sources.get(id))
    }

    pub fn get_mimetypes(&self, class: SelectionClass) -> Vec<MimeType> {
        self.registry.get_mimetypes(&self.sources, class)
    }

    /// Tear a source down.
    ///
    /// The source goes quiet first so that losing its slots does not emit
    /// cancelled, then every class it owns is cleared and every offer that
    /// still points at it is neutralized.
    pub fn destroy_source(&mut self, id: &SourceId) -> Option<DataSource> {
        self.sources.get_mut(id)?.mark_defunct();
        for class in SelectionClass::ALL {
            self.unset_owner(class, id);
        }
        let neutralized = self.offers.neutralize_source(id);
        debug!(source = %id, neutralized, "data source destroyed");
        self.sources.remove(id)
    }
}
