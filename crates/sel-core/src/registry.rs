//! Selection registry: at most one owner per [`SelectionClass`].
//!
//! Ownership changes are queued for the in-session fan-out (devices and
//! persistence, drained by the session after every mutating call) and also
//! published on a broadcast channel for outside observers.

use std::collections::VecDeque;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::ids::SourceId;
use crate::selection::{MimeType, SelectionClass};
use crate::source::SourceStore;

const OWNER_CHANNEL_CAPACITY: usize = 64;

/// A class changed owner. `owner` is `None` when the slot became empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerChanged {
    pub class: SelectionClass,
    pub owner: Option<SourceId>,
}

pub struct SelectionRegistry {
    owners: [Option<SourceId>; 3],
    pending: VecDeque<OwnerChanged>,
    events: broadcast::Sender<OwnerChanged>,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(OWNER_CHANNEL_CAPACITY);
        Self {
            owners: Default::default(),
            pending: VecDeque::new(),
            events,
        }
    }

    pub fn owner(&self, class: SelectionClass) -> Option<&SourceId> {
        self.owners[class.index()].as_ref()
    }

    /// Make `source` the owner of `class`.
    ///
    /// No-op when it already is. Otherwise the previous owner is deactivated
    /// before `source` is activated, then the change is broadcast.
    /// Returns whether ownership changed.
    pub fn set_owner(
        &mut self,
        sources: &mut SourceStore,
        class: SelectionClass,
        source: &SourceId,
    ) -> bool {
        let slot = &mut self.owners[class.index()];
        if slot.as_ref() == Some(source) {
            return false;
        }

        if let Some(previous) = slot.take() {
            if let Some(previous) = sources.get_mut(&previous) {
                previous.deactivate(class);
            }
        }
        *slot = Some(source.clone());
        if let Some(next) = sources.get_mut(source) {
            next.activate(class);
        }

        debug!(%class, source = %source, "selection owner set");
        self.publish(OwnerChanged {
            class,
            owner: Some(source.clone()),
        });
        true
    }

    /// Clear `class` if `source` still owns it. A stale unset is a no-op and
    /// raises no owner-changed. Returns whether the slot was cleared.
    pub fn unset_owner(
        &mut self,
        sources: &mut SourceStore,
        class: SelectionClass,
        source: &SourceId,
    ) -> bool {
        let slot = &mut self.owners[class.index()];
        if slot.as_ref() != Some(source) {
            return false;
        }
        *slot = None;
        if let Some(previous) = sources.get_mut(source) {
            previous.deactivate(class);
        }

        debug!(%class, source = %source, "selection owner unset");
        self.publish(OwnerChanged { class, owner: None });
        true
    }

    /// Mimetypes of the current owner, or an empty list.
    pub fn get_mimetypes(&self, sources: &SourceStore, class: SelectionClass) -> Vec<MimeType> {
        self.owner(class)
            .and_then(|id| sources.get(id))
            .map(|source| source.mimetypes().to_vec())
            .unwrap_or_default()
    }

    /// Next queued change for the in-session fan-out.
    pub fn next_change(&mut self) -> Option<OwnerChanged> {
        self.pending.pop_front()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OwnerChanged> {
        self.events.subscribe()
    }

    fn publish(&mut self, change: OwnerChanged) {
        self.pending.push_back(change.clone());
        // No receivers is fine.
        let _ = self.events.send(change);
    }
}

impl Default for SelectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ids::ClientId;
    use crate::ports::tests::mock_ports::source_backend;
    use crate::source::DataSource;
    use crate::wire::WireProtocol;

    fn insert_source(sources: &mut SourceStore, id: &str, cancels: usize) -> SourceId {
        let mut backend = source_backend();
        backend.expect_cancelled().times(cancels).return_const(());
        let id = SourceId::from(id);
        let mut source = DataSource::new(
            id.clone(),
            Some(ClientId::from("client")),
            WireProtocol::DataDevice,
            Arc::new(backend),
        );
        source.add_mimetype(MimeType::text_plain());
        sources.insert(source);
        id
    }

    #[test]
    fn set_owner_deactivates_previous_then_activates_next() {
        let mut sources = SourceStore::new();
        let mut registry = SelectionRegistry::new();
        let first = insert_source(&mut sources, "first", 1);
        let second = insert_source(&mut sources, "second", 0);

        assert!(registry.set_owner(&mut sources, SelectionClass::Clipboard, &first));
        assert!(registry.set_owner(&mut sources, SelectionClass::Clipboard, &second));

        assert!(!sources.get(&first).unwrap().is_active(SelectionClass::Clipboard));
        assert!(sources.get(&second).unwrap().is_active(SelectionClass::Clipboard));
        assert_eq!(registry.owner(SelectionClass::Clipboard), Some(&second));
    }

    #[test]
    fn setting_same_owner_is_a_noop() {
        let mut sources = SourceStore::new();
        let mut registry = SelectionRegistry::new();
        let id = insert_source(&mut sources, "only", 0);

        assert!(registry.set_owner(&mut sources, SelectionClass::Primary, &id));
        assert!(!registry.set_owner(&mut sources, SelectionClass::Primary, &id));

        assert!(registry.next_change().is_some());
        assert!(registry.next_change().is_none());
    }

    #[test]
    fn stale_unset_is_ignored() {
        let mut sources = SourceStore::new();
        let mut registry = SelectionRegistry::new();
        let old = insert_source(&mut sources, "old", 1);
        let new = insert_source(&mut sources, "new", 0);
        registry.set_owner(&mut sources, SelectionClass::Clipboard, &old);
        registry.set_owner(&mut sources, SelectionClass::Clipboard, &new);
        while registry.next_change().is_some() {}

        assert!(!registry.unset_owner(&mut sources, SelectionClass::Clipboard, &old));

        assert!(!registry.has_pending_changes());
        assert_eq!(registry.owner(SelectionClass::Clipboard), Some(&new));
    }

    #[test]
    fn client_sources_are_not_placeholders() {
        let mut sources = SourceStore::new();
        let mut registry = SelectionRegistry::new();
        let id = insert_source(&mut sources, "client-owned", 0);
        registry.set_owner(&mut sources, SelectionClass::Clipboard, &id);

        let owner = registry
            .owner(SelectionClass::Clipboard)
            .and_then(|owner| sources.get(owner))
            .unwrap();
        assert!(!owner.is_placeholder());
    }

    #[test]
    fn get_mimetypes_of_empty_slot_is_empty() {
        let sources = SourceStore::new();
        let registry = SelectionRegistry::new();
        assert!(registry
            .get_mimetypes(&sources, SelectionClass::Clipboard)
            .is_empty());
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let mut sources = SourceStore::new();
        let mut registry = SelectionRegistry::new();
        let mut rx = registry.subscribe();
        let id = insert_source(&mut sources, "watched", 0);

        registry.set_owner(&mut sources, SelectionClass::DragAndDrop, &id);
        registry.unset_owner(&mut sources, SelectionClass::DragAndDrop, &id);

        assert_eq!(
            rx.recv().await.unwrap(),
            OwnerChanged {
                class: SelectionClass::DragAndDrop,
                owner: Some(id),
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            OwnerChanged {
                class: SelectionClass::DragAndDrop,
                owner: None,
            }
        );
    }
}
