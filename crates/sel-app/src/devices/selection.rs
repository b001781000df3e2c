use sel_core::wire::SelectionWire;
use sel_core::{
    ClientId, DataOffer, DeviceId, OfferId, OwnerChanged, ProtocolError, SelectionClass, Serial,
    SourceId,
};
use tracing::{debug, debug_span};

use super::BoundDevices;
use crate::context::SelectionContext;

/// Result of a set-selection request that was not a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetSelectionOutcome {
    /// The source now owns the selection.
    Set,
    /// A none source cleared a client-owned selection (or nothing was set).
    Cleared,
    /// The serial is older than the last accepted one.
    IgnoredStale,
}

/// Clipboard or primary selection device.
///
/// Both classes share this lifecycle; `W` only decides how events are
/// framed on the wire.
pub struct SelectionDevice<W: SelectionWire> {
    wire: W,
    devices: BoundDevices,
    last_serial: Option<Serial>,
}

impl<W: SelectionWire> SelectionDevice<W> {
    pub fn new(wire: W) -> Self {
        Self {
            wire,
            devices: BoundDevices::default(),
            last_serial: None,
        }
    }

    pub fn class(&self) -> SelectionClass {
        self.wire.class()
    }

    pub fn bind(&mut self, client: &ClientId, device: DeviceId) {
        self.devices.bind(client.clone(), device);
    }

    pub fn release(&mut self, device: &DeviceId) -> Option<ClientId> {
        self.devices.release(device)
    }

    pub fn remove_client(&mut self, client: &ClientId) -> Vec<DeviceId> {
        self.devices.remove_client(client)
    }

    pub fn client_of(&self, device: &DeviceId) -> Option<&ClientId> {
        self.devices.client_of(device)
    }

    /// Handle a set-selection request from `client`.
    ///
    /// ## Behavior / 行为
    ///
    /// - stale serial: ignored without any notification
    /// - foreign source (other client or protocol): protocol error
    /// - requester without keyboard focus: protocol error
    /// - none source: clears the selection only if a client owns it
    pub fn set_selection(
        &mut self,
        ctx: &mut SelectionContext,
        client: &ClientId,
        source: Option<&SourceId>,
        serial: Serial,
    ) -> Result<SetSelectionOutcome, ProtocolError> {
        let class = self.class();
        let span = debug_span!("selection.device.set_selection", %client, %class, %serial);
        let _guard = span.enter();

        if let Some(last) = self.last_serial {
            if serial.is_older_than(last) {
                debug!(last = %last, "stale set_selection ignored");
                return Ok(SetSelectionOutcome::IgnoredStale);
            }
        }

        if ctx.ports.focus.focused_client().as_ref() != Some(client) {
            return Err(ProtocolError::NotFocused(class));
        }

        if let Some(id) = source {
            let data_source = ctx
                .sources
                .get_mut(id)
                .ok_or_else(|| ProtocolError::unknown("source", id))?;
            if data_source.client() != Some(client) {
                return Err(ProtocolError::InvalidSource {
                    source_id: id.clone(),
                    reason: "source belongs to another client",
                });
            }
            if data_source.protocol() != self.wire.protocol() {
                return Err(ProtocolError::InvalidSource {
                    source_id: id.clone(),
                    reason: "source was created on another protocol",
                });
            }
            data_source.mark_used_for_selection()?;
        }

        self.last_serial = Some(serial);
        match source {
            Some(id) => {
                ctx.set_owner(class, id);
                Ok(SetSelectionOutcome::Set)
            }
            None => {
                let client_owned = ctx
                    .owner_source(class)
                    .filter(|owner| !owner.is_placeholder())
                    .map(|owner| owner.id().clone());
                if let Some(owner) = client_owned {
                    ctx.unset_owner(class, &owner);
                }
                Ok(SetSelectionOutcome::Cleared)
            }
        }
    }

    /// Fan-out of an owner change: only the keyboard-focused client hears
    /// about it. Changes already superseded by a newer one are skipped.
    pub fn on_owner_changed(&self, ctx: &mut SelectionContext, change: &OwnerChanged) {
        if change.class != self.class() || ctx.owner(change.class) != change.owner.as_ref() {
            return;
        }
        if let Some(focused) = ctx.ports.focus.focused_client() {
            self.offer_to(ctx, &focused);
        }
    }

    /// Send the current selection to every device of `client`.
    pub fn offer_to(&self, ctx: &mut SelectionContext, client: &ClientId) {
        for device in self.devices.devices_of(client) {
            self.offer_to_device(ctx, client, &device);
        }
    }

    /// A fresh offer with its mimetypes followed by selection, or an
    /// explicit empty selection.
    pub fn offer_to_device(&self, ctx: &mut SelectionContext, client: &ClientId, device: &DeviceId) {
        let class = self.class();
        let Some(source) = ctx.owner(class).cloned() else {
            ctx.ports
                .events
                .send(client, self.wire.selection(device, None));
            return;
        };
        let mime_types = ctx.get_mimetypes(class);

        let offer_id = OfferId::new();
        ctx.offers.insert(DataOffer::new(
            offer_id.clone(),
            client.clone(),
            device.clone(),
            self.wire.protocol(),
            class,
            Some(source),
        ));
        for event in self.wire.announce(device, &offer_id, &mime_types) {
            ctx.ports.events.send(client, event);
        }
        ctx.ports
            .events
            .send(client, self.wire.selection(device, Some(offer_id)));
    }
}
