//! Drag-and-drop device.
//!
//! Owns at most one in-progress drag per seat. Input is turned into
//! [`DragEvent`]s, the pure [`DragStateMachine`] decides, and this device
//! applies the resulting [`DragAction`]s against the context and ports.

use sel_core::drag::{DragAction, DragEvent, DragState, DragStateMachine};
use sel_core::ports::{GrabDevice, SurfaceHit};
use sel_core::wire::{DataDeviceWire, SelectionWire};
use sel_core::{
    ButtonMask, ClientId, DataOffer, DeviceId, MimeType, Modifiers, OfferId, ProtocolError,
    SelectionClass, Serial, SourceId, SurfaceId, WireEvent, WireProtocol,
};
use tracing::{debug, debug_span, info_span, warn, Instrument};

use super::BoundDevices;
use crate::context::{SelectionContext, TaskCompletion};
use crate::data_offer;
use crate::transfer::Transfer;

/// Destination currently entered, with the offer it was given.
struct FocusTarget {
    client: ClientId,
    device: DeviceId,
    offer: Option<OfferId>,
}

struct ActiveDrag {
    state: DragState,
    client: ClientId,
    source: Option<SourceId>,
    icon: Option<SurfaceId>,
    grab: GrabDevice,
    held_buttons: ButtonMask,
    serial: Serial,
    target: Option<FocusTarget>,
}

pub struct DndDevice {
    wire: DataDeviceWire,
    devices: BoundDevices,
    drag: Option<ActiveDrag>,
}

impl Default for DndDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl DndDevice {
    pub fn new() -> Self {
        Self {
            wire: DataDeviceWire,
            devices: BoundDevices::default(),
            drag: None,
        }
    }

    pub fn bind(&mut self, client: &ClientId, device: DeviceId) {
        self.devices.bind(client.clone(), device);
    }

    pub fn release(&mut self, device: &DeviceId) -> Option<ClientId> {
        self.devices.release(device)
    }

    pub fn client_of(&self, device: &DeviceId) -> Option<&ClientId> {
        self.devices.client_of(device)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drags_source(&self, source: &SourceId) -> bool {
        self.drag
            .as_ref()
            .is_some_and(|drag| drag.source.as_ref() == Some(source))
    }

    /// Start a drag from `origin`.
    ///
    /// Returns `Ok(false)` without side effects when no press grab on
    /// `origin` matches `serial`, or when a drag is already running.
    #[allow(clippy::too_many_arguments)]
    pub fn start_drag(
        &mut self,
        ctx: &mut SelectionContext,
        client: &ClientId,
        device: &DeviceId,
        source: Option<&SourceId>,
        origin: &SurfaceId,
        icon: Option<&SurfaceId>,
        serial: Serial,
    ) -> Result<bool, ProtocolError> {
        let span = debug_span!("selection.dnd.start_drag", %client, %origin, %serial);
        let _guard = span.enter();

        if self.devices.client_of(device) != Some(client) {
            return Err(ProtocolError::unknown("device", device));
        }
        if let Some(id) = source {
            let data_source = ctx
                .sources
                .get(id)
                .ok_or_else(|| ProtocolError::unknown("source", id))?;
            if data_source.client() != Some(client)
                || data_source.protocol() != WireProtocol::DataDevice
            {
                return Err(ProtocolError::InvalidSource {
                    source_id: id.clone(),
                    reason: "source cannot be dragged by this device",
                });
            }
        }
        if self.drag.is_some() {
            debug!("drag already in progress");
            return Ok(false);
        }
        let Some(grab) = ctx.ports.grab.press_grab(origin, serial) else {
            debug!("no press grab matches the drag serial");
            return Ok(false);
        };

        let held_buttons = ctx.ports.grab.buttons();
        if let Some(id) = source {
            if let Some(data_source) = ctx.sources.get_mut(id) {
                data_source.mark_used_for_drag()?;
                data_source.set_user_action(ctx.ports.grab.modifiers().user_action(held_buttons));
            }
            ctx.set_owner(SelectionClass::DragAndDrop, id);
        }

        ctx.ports.grab.begin_drag_grab(grab);
        let position = ctx.ports.grab.pointer_position();
        if let Some(icon) = icon {
            ctx.ports.visual.attach_drag_icon(icon, position);
        }
        debug!(?grab, source = ?source, "drag started");

        self.drag = Some(ActiveDrag {
            state: DragState::start(source.is_none().then(|| client.clone())),
            client: client.clone(),
            source: source.cloned(),
            icon: icon.cloned(),
            grab,
            held_buttons,
            serial,
            target: None,
        });

        let hit = ctx.ports.visual.surface_at(position);
        self.handle(
            ctx,
            DragEvent::Motion {
                hit,
                position,
                time: 0,
            },
        );
        Ok(true)
    }

    pub fn motion(&mut self, ctx: &mut SelectionContext, time: u32) {
        if self.drag.is_none() {
            return;
        }
        let position = ctx.ports.grab.pointer_position();
        let hit = ctx.ports.visual.surface_at(position);
        self.handle(
            ctx,
            DragEvent::Motion {
                hit,
                position,
                time,
            },
        );
    }

    /// Pointer button state changed; `buttons` is what is still held.
    pub fn button(&mut self, ctx: &mut SelectionContext, buttons: ButtonMask) {
        let Some(drag) = &self.drag else {
            return;
        };
        let ends = drag.grab == GrabDevice::Pointer && !buttons.intersects(drag.held_buttons);
        let action = ctx.ports.grab.modifiers().user_action(buttons);
        self.handle(ctx, DragEvent::UserAction { action });
        if ends {
            self.end_grab(ctx);
        }
    }

    pub fn touch_up(&mut self, ctx: &mut SelectionContext, slot: i32) {
        let ends = self
            .drag
            .as_ref()
            .is_some_and(|drag| drag.grab == GrabDevice::Touch { slot });
        if ends {
            self.end_grab(ctx);
        }
    }

    pub fn modifiers(&mut self, ctx: &mut SelectionContext, modifiers: Modifiers) {
        if self.drag.is_none() {
            return;
        }
        let action = modifiers.user_action(ctx.ports.grab.buttons());
        self.handle(ctx, DragEvent::UserAction { action });
    }

    pub fn escape(&mut self, ctx: &mut SelectionContext) {
        self.handle(ctx, DragEvent::Escape);
    }

    /// The dragged source was destroyed. Call after the context dropped it.
    pub fn source_destroyed(&mut self, ctx: &mut SelectionContext, source: &SourceId) {
        if self.drags_source(source) {
            self.handle(ctx, DragEvent::SourceGone);
        }
    }

    /// `client` disconnected: end its drag, forget it as a destination.
    pub fn remove_client(&mut self, ctx: &mut SelectionContext, client: &ClientId) {
        self.devices.remove_client(client);
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if drag
            .target
            .as_ref()
            .is_some_and(|target| &target.client == client)
        {
            drag.target = None;
        }
        if &drag.client == client {
            self.handle(ctx, DragEvent::SourceGone);
        }
    }

    fn end_grab(&mut self, ctx: &mut SelectionContext) {
        let Some(drag) = &self.drag else {
            return;
        };
        let focused = drag.state.focus().is_some();
        let target_ready = match (&drag.source, &drag.target) {
            (None, _) => focused,
            (Some(_), Some(FocusTarget { offer: Some(offer), .. })) => ctx
                .offers
                .get(offer)
                .is_some_and(|offer| offer.is_drop_target_ready()),
            _ => false,
        };
        let desktop_drop = !focused && desktop_drop_mime(ctx, drag.source.as_ref()).is_some();
        self.handle(
            ctx,
            DragEvent::Release {
                target_ready,
                desktop_drop,
            },
        );
    }

    fn handle(&mut self, ctx: &mut SelectionContext, event: DragEvent) {
        let Some(mut drag) = self.drag.take() else {
            return;
        };
        let state = std::mem::replace(&mut drag.state, DragState::start(None));
        let (next, actions) = DragStateMachine::transition(state, event);
        drag.state = next;

        for action in actions {
            self.apply(ctx, &mut drag, action);
        }

        if let DragState::Ended(outcome) = drag.state {
            debug!(?outcome, "drag ended");
        } else {
            self.drag = Some(drag);
        }
    }

    fn apply(&self, ctx: &mut SelectionContext, drag: &mut ActiveDrag, action: DragAction) {
        match action {
            DragAction::MoveIcon { position } => {
                if let Some(icon) = &drag.icon {
                    ctx.ports.visual.move_drag_icon(icon, position);
                }
            }
            DragAction::FocusOut { .. } => {
                if let Some(target) = drag.target.take() {
                    ctx.ports.events.send(
                        &target.client,
                        WireEvent::Leave {
                            device: target.device,
                        },
                    );
                    if let Some(offer) = target.offer {
                        ctx.offers.detach(&offer);
                    }
                }
            }
            DragAction::FocusIn { hit } => {
                drag.target = self.enter(ctx, drag, hit);
            }
            DragAction::Motion { local, time } => {
                if let Some(target) = &drag.target {
                    ctx.ports.events.send(
                        &target.client,
                        WireEvent::Motion {
                            device: target.device.clone(),
                            time,
                            x: local.x,
                            y: local.y,
                        },
                    );
                }
            }
            DragAction::UpdateUserAction { action } => {
                if let Some(source) = &drag.source {
                    if let Some(data_source) = ctx.sources.get_mut(source) {
                        data_source.set_user_action(action);
                    }
                    data_offer::renegotiate_source(ctx, source);
                }
            }
            DragAction::Drop { .. } => {
                if let Some(target) = drag.target.take() {
                    ctx.ports.events.send(
                        &target.client,
                        WireEvent::Drop {
                            device: target.device,
                        },
                    );
                    if let Some(offer) = target.offer.and_then(|id| ctx.offers.get_mut(&id)) {
                        offer.mark_dropped();
                    }
                }
                if let Some(source) = drag.source.as_ref().and_then(|id| ctx.sources.get_mut(id)) {
                    source.notify_drop_performed();
                }
            }
            DragAction::DesktopDrop => desktop_drop(ctx, drag.source.as_ref()),
            DragAction::CancelSource => {
                if let Some(source) = drag.source.as_ref().and_then(|id| ctx.sources.get_mut(id)) {
                    source.cancel();
                }
            }
            DragAction::Teardown => {
                if let Some(icon) = &drag.icon {
                    ctx.ports.visual.detach_drag_icon(icon);
                }
                ctx.ports.grab.end_drag_grab();
                if let Some(source) = &drag.source {
                    ctx.unset_owner(SelectionClass::DragAndDrop, source);
                }
            }
        }
    }

    /// Enter `hit`: a fresh offer (with source actions) when the drag has a
    /// source, then the enter event itself.
    fn enter(
        &self,
        ctx: &mut SelectionContext,
        drag: &ActiveDrag,
        hit: SurfaceHit,
    ) -> Option<FocusTarget> {
        let device = self.devices.first_of(&hit.client)?;

        let mut offer = None;
        if let Some(source_id) = &drag.source {
            if let Some(source) = ctx.sources.get(source_id) {
                let offer_id = OfferId::new();
                let mime_types = source.mimetypes().to_vec();
                let actions = source.actions();
                ctx.offers.insert(DataOffer::new(
                    offer_id.clone(),
                    hit.client.clone(),
                    device.clone(),
                    WireProtocol::DataDevice,
                    SelectionClass::DragAndDrop,
                    Some(source_id.clone()),
                ));
                for event in self.wire.announce(&device, &offer_id, &mime_types) {
                    ctx.ports.events.send(&hit.client, event);
                }
                ctx.ports.events.send(
                    &hit.client,
                    WireEvent::SourceActions {
                        offer: offer_id.clone(),
                        actions,
                    },
                );
                offer = Some(offer_id);
            }
        }

        ctx.ports.events.send(
            &hit.client,
            WireEvent::Enter {
                device: device.clone(),
                serial: drag.serial,
                surface: hit.surface,
                x: hit.local.x,
                y: hit.local.y,
                offer: offer.clone(),
            },
        );
        Some(FocusTarget {
            client: hit.client,
            device,
            offer,
        })
    }
}

/// First configured desktop-drop mimetype the source advertises.
fn desktop_drop_mime(ctx: &SelectionContext, source: Option<&SourceId>) -> Option<MimeType> {
    if !ctx.config.dnd.desktop_drop {
        return None;
    }
    let source = ctx.sources.get(source?)?;
    ctx.config
        .dnd
        .desktop_drop_mime_types
        .iter()
        .find(|mime| source.has_mimetype(mime))
        .cloned()
}

/// Complete a drag released over no surface: drain the source into a null
/// sink, then report drop-performed. Finished (or cancelled) is delivered
/// by the session once the drain posts its completion.
fn desktop_drop(ctx: &mut SelectionContext, source: Option<&SourceId>) {
    let (Some(source_id), Some(mime_type)) = (source, desktop_drop_mime(ctx, source)) else {
        return;
    };
    let transfer = Transfer::from_source(
        ctx,
        Some(source_id),
        mime_type.clone(),
        None,
        Box::new(tokio::io::sink()),
    );
    let Some(data_source) = ctx.sources.get_mut(source_id) else {
        return;
    };
    data_source.notify_drop_performed();

    let span = info_span!("selection.dnd.desktop_drop", source = %source_id, mime = %mime_type);
    let cancel = ctx.transfers.token();
    let completions = ctx.completions.sender();
    let source_id = source_id.clone();
    ctx.transfers.spawn_task(
        async move {
            let completion = match transfer.run(cancel).await {
                Ok(bytes) => {
                    debug!(bytes, "desktop drop drained");
                    TaskCompletion::DesktopDropFinished(source_id)
                }
                Err(err) => {
                    warn!(error = %err, "desktop drop failed");
                    TaskCompletion::DesktopDropFailed(source_id)
                }
            };
            let _ = completions.send(completion);
        }
        .instrument(span),
    );
}
