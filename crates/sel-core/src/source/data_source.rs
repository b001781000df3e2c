use std::sync::Arc;

use crate::error::{ProtocolError, TransferError};
use crate::ids::{ClientId, SourceId};
use crate::ports::DataSourceBackend;
use crate::selection::{DndAction, MimeType, SelectionClass};
use crate::wire::WireProtocol;

/// What a source has been used for so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceUsage {
    #[default]
    Unused,
    Selection,
    Drag,
}

#[derive(Debug, Default)]
struct DndState {
    actions: DndAction,
    actions_set: bool,
    user_action: DndAction,
    current_action: DndAction,
    has_target: bool,
    drop_performed: bool,
    in_ask: bool,
}

/// Advertised formats plus the backend that produces bytes on demand.
///
/// ## Notifications / 通知
///
/// Every notification toward the owner goes through the backend. Once a
/// source is marked defunct (its owner destroyed it) nothing is emitted
/// anymore; loss of selection is reported at most once.
pub struct DataSource {
    id: SourceId,
    client: Option<ClientId>,
    protocol: WireProtocol,
    mime_types: Vec<MimeType>,
    active: [bool; 3],
    cancelled: bool,
    defunct: bool,
    usage: SourceUsage,
    backend: Arc<dyn DataSourceBackend>,
    dnd: DndState,
}

impl DataSource {
    pub fn new(
        id: SourceId,
        client: Option<ClientId>,
        protocol: WireProtocol,
        backend: Arc<dyn DataSourceBackend>,
    ) -> Self {
        Self {
            id,
            client,
            protocol,
            mime_types: Vec::new(),
            active: [false; 3],
            cancelled: false,
            defunct: false,
            usage: SourceUsage::Unused,
            backend,
            dnd: DndState::default(),
        }
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Owning client; `None` for the memory placeholder.
    pub fn client(&self) -> Option<&ClientId> {
        self.client.as_ref()
    }

    pub fn protocol(&self) -> WireProtocol {
        self.protocol
    }

    pub fn usage(&self) -> SourceUsage {
        self.usage
    }

    pub fn is_placeholder(&self) -> bool {
        self.backend.is_placeholder()
    }

    /// Duplicates are ignored; order of first insertion is kept.
    pub fn add_mimetype(&mut self, mime_type: MimeType) {
        if !self.mime_types.contains(&mime_type) {
            self.mime_types.push(mime_type);
        }
    }

    pub fn mimetypes(&self) -> &[MimeType] {
        &self.mime_types
    }

    pub fn has_mimetype(&self, mime_type: &MimeType) -> bool {
        self.mime_types.iter().any(|m| m.matches(mime_type.as_str()))
    }

    /// Resolve the backend that will stream `mime_type`.
    pub fn read(&self, mime_type: &MimeType) -> Result<Arc<dyn DataSourceBackend>, TransferError> {
        if !self.has_mimetype(mime_type) {
            return Err(TransferError::NotOffered(mime_type.clone()));
        }
        Ok(Arc::clone(&self.backend))
    }

    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        if !self.defunct {
            self.backend.cancelled();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// The owner destroyed the source; suppress every further notification.
    pub fn mark_defunct(&mut self) {
        self.defunct = true;
    }

    pub fn is_defunct(&self) -> bool {
        self.defunct
    }

    pub fn is_active(&self, class: SelectionClass) -> bool {
        self.active[class.index()]
    }

    pub fn is_active_anywhere(&self) -> bool {
        self.active.iter().any(|active| *active)
    }

    pub(crate) fn activate(&mut self, class: SelectionClass) {
        self.active[class.index()] = true;
    }

    /// Losing a clipboard or primary selection cancels the source. Losing
    /// the drag-and-drop slot does not.
    pub(crate) fn deactivate(&mut self, class: SelectionClass) {
        if !std::mem::replace(&mut self.active[class.index()], false) {
            return;
        }
        if class.cancels_on_loss() {
            self.cancel();
        }
    }

    pub fn mark_used_for_selection(&mut self) -> Result<(), ProtocolError> {
        if self.dnd.actions_set || self.usage == SourceUsage::Drag {
            return Err(ProtocolError::InvalidSource {
                source_id: self.id.clone(),
                reason: "drag-and-drop source used for a selection",
            });
        }
        self.usage = SourceUsage::Selection;
        Ok(())
    }

    pub fn mark_used_for_drag(&mut self) -> Result<(), ProtocolError> {
        if self.usage != SourceUsage::Unused {
            return Err(ProtocolError::InvalidSource {
                source_id: self.id.clone(),
                reason: "source was already used",
            });
        }
        self.usage = SourceUsage::Drag;
        Ok(())
    }

    /// Set the drag-and-drop actions the owner supports. Allowed once, and
    /// only before the source starts a drag.
    pub fn set_actions(&mut self, mask: u32) -> Result<(), ProtocolError> {
        let actions = DndAction::from_wire(mask)?;
        if self.dnd.actions_set {
            return Err(ProtocolError::ActionsAlreadySet);
        }
        if self.usage == SourceUsage::Drag {
            return Err(ProtocolError::DragAlreadyStarted);
        }
        self.dnd.actions = actions;
        self.dnd.actions_set = true;
        Ok(())
    }

    pub fn actions(&self) -> DndAction {
        self.dnd.actions
    }

    pub fn user_action(&self) -> DndAction {
        self.dnd.user_action
    }

    pub fn set_user_action(&mut self, action: DndAction) {
        self.dnd.user_action = action;
    }

    pub fn current_action(&self) -> DndAction {
        self.dnd.current_action
    }

    /// Returns whether the action changed. The owner is told only on change,
    /// and not while an "ask" drop is pending.
    pub fn set_current_action(&mut self, action: DndAction) -> bool {
        if self.dnd.current_action == action {
            return false;
        }
        self.dnd.current_action = action;
        if !self.dnd.in_ask && !self.defunct {
            self.backend.action(action);
        }
        true
    }

    pub fn target(&mut self, mime_type: Option<MimeType>) {
        self.dnd.has_target = mime_type.is_some();
        if !self.defunct {
            self.backend.target(mime_type);
        }
    }

    pub fn has_target(&self) -> bool {
        self.dnd.has_target
    }

    pub fn drop_performed(&self) -> bool {
        self.dnd.drop_performed
    }

    pub fn in_ask(&self) -> bool {
        self.dnd.in_ask
    }

    /// Edge-triggered: a second call is a no-op.
    pub fn notify_drop_performed(&mut self) {
        if self.dnd.drop_performed {
            return;
        }
        self.dnd.drop_performed = true;
        if self.dnd.current_action == DndAction::ASK {
            self.dnd.in_ask = true;
        }
        if !self.defunct {
            self.backend.drop_performed();
        }
    }

    pub fn notify_finish(&mut self) {
        if self.defunct {
            return;
        }
        if std::mem::take(&mut self.dnd.in_ask) {
            self.backend.action(self.dnd.current_action);
        }
        self.backend.finished();
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("id", &self.id)
            .field("client", &self.client)
            .field("protocol", &self.protocol)
            .field("mime_types", &self.mime_types)
            .field("usage", &self.usage)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::tests::mock_ports::{source_backend, MockSourceBackend};
    use mockall::predicate::eq;

    fn source_with(backend: MockSourceBackend) -> DataSource {
        DataSource::new(
            SourceId::from("source-1"),
            Some(ClientId::from("client-1")),
            WireProtocol::DataDevice,
            Arc::new(backend),
        )
    }

    #[test]
    fn duplicate_mimetypes_are_ignored() {
        let mut source = source_with(source_backend());
        source.add_mimetype(MimeType::text_plain());
        source.add_mimetype(MimeType::uri_list());
        source.add_mimetype(MimeType::text_plain());

        assert_eq!(
            source.mimetypes(),
            &[MimeType::text_plain(), MimeType::uri_list()]
        );
    }

    #[test]
    fn read_rejects_unadvertised_mimetype() {
        let mut source = source_with(source_backend());
        source.add_mimetype(MimeType::text_plain());

        assert!(source.read(&MimeType::text_plain()).is_ok());
        assert!(matches!(
            source.read(&MimeType::uri_list()),
            Err(TransferError::NotOffered(_))
        ));
    }

    #[test]
    fn cancel_is_reported_once() {
        let mut backend = source_backend();
        backend.expect_cancelled().times(1).return_const(());
        let mut source = source_with(backend);

        source.cancel();
        source.cancel();

        assert!(source.is_cancelled());
    }

    #[test]
    fn defunct_source_is_never_notified() {
        let mut backend = source_backend();
        backend.expect_cancelled().never();
        backend.expect_finished().never();
        let mut source = source_with(backend);

        source.mark_defunct();
        source.cancel();
        source.notify_finish();
    }

    #[test]
    fn losing_dnd_slot_does_not_cancel() {
        let mut backend = source_backend();
        backend.expect_cancelled().times(1).return_const(());
        let mut source = source_with(backend);

        source.activate(SelectionClass::DragAndDrop);
        source.deactivate(SelectionClass::DragAndDrop);
        source.activate(SelectionClass::Clipboard);
        source.deactivate(SelectionClass::Clipboard);
    }

    #[test]
    fn set_actions_only_once_and_before_drag() {
        let mut source = source_with(source_backend());
        assert_eq!(
            source.set_actions(16),
            Err(ProtocolError::InvalidActionMask(16))
        );
        assert_eq!(source.set_actions(3), Ok(()));
        assert_eq!(source.set_actions(1), Err(ProtocolError::ActionsAlreadySet));

        let mut dragged = source_with(source_backend());
        dragged.mark_used_for_drag().unwrap();
        assert_eq!(dragged.set_actions(1), Err(ProtocolError::DragAlreadyStarted));
    }

    #[test]
    fn dnd_source_cannot_become_a_selection() {
        let mut source = source_with(source_backend());
        source.set_actions(1).unwrap();

        assert!(matches!(
            source.mark_used_for_selection(),
            Err(ProtocolError::InvalidSource { .. })
        ));
    }

    #[test]
    fn source_drags_at_most_once() {
        let mut source = source_with(source_backend());
        source.mark_used_for_drag().unwrap();
        assert!(source.mark_used_for_drag().is_err());
    }

    #[test]
    fn current_action_is_emitted_only_on_change() {
        let mut backend = source_backend();
        backend
            .expect_action()
            .with(eq(DndAction::MOVE))
            .times(1)
            .return_const(());
        let mut source = source_with(backend);

        assert!(source.set_current_action(DndAction::MOVE));
        assert!(!source.set_current_action(DndAction::MOVE));
    }

    #[test]
    fn ask_is_flushed_on_finish() {
        let mut backend = source_backend();
        let mut seq = mockall::Sequence::new();
        backend
            .expect_action()
            .with(eq(DndAction::ASK))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend
            .expect_drop_performed()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend
            .expect_action()
            .with(eq(DndAction::COPY))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        backend
            .expect_finished()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        let mut source = source_with(backend);

        source.set_current_action(DndAction::ASK);
        source.notify_drop_performed();
        source.notify_drop_performed();
        assert!(source.in_ask());

        // destination resolved the ask; suppressed until finish
        source.set_current_action(DndAction::COPY);
        source.notify_finish();
        assert!(!source.in_ask());
    }
}
