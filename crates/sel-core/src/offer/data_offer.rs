use crate::error::ProtocolError;
use crate::ids::{ClientId, DeviceId, OfferId, SourceId};
use crate::selection::{DndAction, MimeType, SelectionClass};
use crate::wire::WireProtocol;

#[derive(Debug, Default, Clone)]
struct OfferDnd {
    actions: DndAction,
    preferred: DndAction,
    /// Last action pushed to the destination.
    action: DndAction,
    dropped: bool,
    finished: bool,
}

/// One source as seen by one client at one point in time.
///
/// The source is held as a handle only. When the source goes away the
/// handle is cleared and the offer stays behind, neutralized.
#[derive(Debug, Clone)]
pub struct DataOffer {
    id: OfferId,
    client: ClientId,
    device: DeviceId,
    protocol: WireProtocol,
    class: SelectionClass,
    source: Option<SourceId>,
    accepted: Option<MimeType>,
    dnd: OfferDnd,
}

impl DataOffer {
    pub fn new(
        id: OfferId,
        client: ClientId,
        device: DeviceId,
        protocol: WireProtocol,
        class: SelectionClass,
        source: Option<SourceId>,
    ) -> Self {
        Self {
            id,
            client,
            device,
            protocol,
            class,
            source,
            accepted: None,
            dnd: OfferDnd::default(),
        }
    }

    pub fn id(&self) -> &OfferId {
        &self.id
    }

    pub fn client(&self) -> &ClientId {
        &self.client
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    pub fn protocol(&self) -> WireProtocol {
        self.protocol
    }

    pub fn class(&self) -> SelectionClass {
        self.class
    }

    pub fn is_dnd(&self) -> bool {
        self.class == SelectionClass::DragAndDrop
    }

    /// Source handle, `None` once neutralized.
    pub fn source(&self) -> Option<&SourceId> {
        self.source.as_ref()
    }

    pub fn is_neutralized(&self) -> bool {
        self.source.is_none()
    }

    pub(crate) fn neutralize(&mut self) {
        self.source = None;
    }

    pub fn accept(&mut self, mime_type: Option<MimeType>) {
        self.accepted = mime_type;
    }

    pub fn accepted(&self) -> Option<&MimeType> {
        self.accepted.as_ref()
    }

    /// Validate and store destination actions.
    ///
    /// `preferred` must be none or a single action within `supported`.
    pub fn set_actions(&mut self, supported: u32, preferred: u32) -> Result<(), ProtocolError> {
        if !self.is_dnd() {
            return Err(ProtocolError::NotDragAndDrop);
        }
        let supported = DndAction::from_wire(supported)?;
        let preferred = DndAction::from_wire(preferred)?;
        if !preferred.is_empty() && (!preferred.is_single() || !supported.contains(preferred)) {
            return Err(ProtocolError::InvalidAction {
                supported,
                preferred,
            });
        }
        self.dnd.actions = supported;
        self.dnd.preferred = preferred;
        Ok(())
    }

    pub fn actions(&self) -> DndAction {
        self.dnd.actions
    }

    pub fn preferred_action(&self) -> DndAction {
        self.dnd.preferred
    }

    /// Last action sent to the destination.
    pub fn action(&self) -> DndAction {
        self.dnd.action
    }

    /// Record the action pushed to the destination; returns whether it
    /// differs from the last one sent.
    pub fn record_action(&mut self, action: DndAction) -> bool {
        if self.dnd.action == action {
            return false;
        }
        self.dnd.action = action;
        true
    }

    /// A drop on this offer can proceed: a mimetype was accepted and a
    /// real action was negotiated.
    pub fn is_drop_target_ready(&self) -> bool {
        self.accepted.is_some() && !self.dnd.action.is_empty()
    }

    pub fn mark_dropped(&mut self) {
        self.dnd.dropped = true;
    }

    pub fn is_dropped(&self) -> bool {
        self.dnd.dropped
    }

    /// Guarded completion of a drop.
    pub fn finish(&mut self) -> Result<(), ProtocolError> {
        if !self.is_drop_target_ready() {
            return Err(ProtocolError::PrematureFinish);
        }
        self.dnd.finished = true;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.dnd.finished
    }

    /// Destroying this offer must cancel its source: it was dropped on but
    /// never finished.
    pub fn abandons_drop(&self) -> bool {
        self.dnd.dropped && !self.dnd.finished
    }
}
