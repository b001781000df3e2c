//! Selection session.
//!
//! The single entry point of the broker. It owns the context, the three
//! protocol devices and clipboard persistence, dispatches client requests,
//! and fans owner changes out at the end of every mutating call.
//!
//! All methods run on the caller's task. Transfers are spawned onto the
//! ambient Tokio runtime, so the session must be driven from inside one.

use std::sync::Arc;

use anyhow::{Context, Result};
use sel_core::persistence::ClipboardSnapshot;
use sel_core::ports::TransferSink;
use sel_core::wire::{DataDeviceWire, PrimarySelectionWire, Request};
use sel_core::{
    ButtonMask, ClientId, DataSource, DeviceId, MimeType, Modifiers, OfferId, OwnerChanged,
    ProtocolError, SelectionClass, Serial, SessionConfig, SourceId, SurfaceId, TransferError,
    WireProtocol,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, info, info_span, warn};

use crate::context::{SelectionContext, SessionPorts, TaskCompletion};
use crate::data_offer;
use crate::devices::{DndDevice, SelectionDevice, SetSelectionOutcome};
use crate::persistence::ClipboardPersistence;
use crate::sources::ClientSourceBackend;
use crate::transfer::Transfer;

pub type TransferHandle = JoinHandle<Result<u64, TransferError>>;

pub struct SelectionSession {
    ctx: SelectionContext,
    clipboard: SelectionDevice<DataDeviceWire>,
    primary: SelectionDevice<PrimarySelectionWire>,
    dnd: DndDevice,
    persistence: ClipboardPersistence,
    focus: Option<ClientId>,
}

impl SelectionSession {
    pub fn new(ports: SessionPorts, config: SessionConfig) -> Result<Self> {
        config
            .validate()
            .context("invalid selection session configuration")?;
        let persistence = ClipboardPersistence::new(&config.persistence);
        info!(
            chunk_size = config.transfer.chunk_size,
            persistence = config.persistence.enabled,
            desktop_drop = config.dnd.desktop_drop,
            "selection session created"
        );
        Ok(Self {
            ctx: SelectionContext::new(ports, config),
            clipboard: SelectionDevice::new(DataDeviceWire),
            primary: SelectionDevice::new(PrimarySelectionWire),
            dnd: DndDevice::new(),
            persistence,
            focus: None,
        })
    }

    pub fn context(&self) -> &SelectionContext {
        &self.ctx
    }

    /// Handle one client request.
    ///
    /// A protocol error is posted to the client and terminates all of its
    /// state before it is returned.
    pub fn dispatch(&mut self, client: &ClientId, request: Request) -> Result<(), ProtocolError> {
        let name = request.name();
        self.guarded(client, name, |session| session.handle_request(client, request))
    }

    pub fn bind_device(&mut self, client: &ClientId, protocol: WireProtocol) -> DeviceId {
        let device = DeviceId::new();
        self.bind(client, device.clone(), protocol);
        self.pump();
        device
    }

    pub fn release_device(&mut self, client: &ClientId, device: &DeviceId) -> Result<(), ProtocolError> {
        self.guarded(client, "release_device", |session| {
            session.release_device_inner(client, device)
        })
    }

    /// Create a source advertising `mime_types`.
    pub fn create_source(
        &mut self,
        client: &ClientId,
        protocol: WireProtocol,
        mime_types: &[MimeType],
    ) -> Result<SourceId, ProtocolError> {
        self.guarded(client, "create_source", |session| {
            let source = SourceId::new();
            session.create_source_inner(client, source.clone(), protocol)?;
            let created = session.owned_source_mut(client, &source)?;
            for mime_type in mime_types {
                created.add_mimetype(mime_type.clone());
            }
            Ok(source)
        })
    }

    pub fn destroy_source(&mut self, client: &ClientId, source: &SourceId) -> Result<(), ProtocolError> {
        self.guarded(client, "source.destroy", |session| {
            session.owned_source_mut(client, source)?;
            session.destroy_source_inner(source);
            Ok(())
        })
    }

    pub fn set_selection(
        &mut self,
        client: &ClientId,
        device: &DeviceId,
        source: Option<&SourceId>,
        serial: Serial,
    ) -> Result<SetSelectionOutcome, ProtocolError> {
        self.guarded(client, "set_selection", |session| {
            session.set_selection_inner(client, device, source, serial)
        })
    }

    /// Returns whether a drag actually started.
    pub fn start_drag(
        &mut self,
        client: &ClientId,
        device: &DeviceId,
        source: Option<&SourceId>,
        origin: &SurfaceId,
        icon: Option<&SurfaceId>,
        serial: Serial,
    ) -> Result<bool, ProtocolError> {
        self.guarded(client, "start_drag", |session| {
            session
                .dnd
                .start_drag(&mut session.ctx, client, device, source, origin, icon, serial)
        })
    }

    /// `offer.receive` returning the spawned transfer.
    pub fn receive(
        &mut self,
        client: &ClientId,
        offer: &OfferId,
        mime_type: MimeType,
        sink: TransferSink,
    ) -> Result<TransferHandle, ProtocolError> {
        self.guarded(client, "offer.receive", |session| {
            data_offer::receive(&mut session.ctx, client, offer, mime_type, sink)
        })
    }

    /// Drop everything `client` owns: sources, offers, devices, its drag.
    pub fn client_disconnected(&mut self, client: &ClientId) {
        let _guard = info_span!("selection.session.client_disconnected", %client).entered();
        self.terminate_client(client);
        self.pump();
    }

    /// Re-offer the selections when keyboard focus moved to another client.
    pub fn keyboard_focus_changed(&mut self) {
        let focused = self.ctx.ports.focus.focused_client();
        if focused == self.focus {
            return;
        }
        debug!(focus = ?focused, "keyboard focus changed");
        self.focus = focused.clone();
        if let Some(client) = focused {
            self.clipboard.offer_to(&mut self.ctx, &client);
            self.primary.offer_to(&mut self.ctx, &client);
        }
        self.pump();
    }

    pub fn is_dragging(&self) -> bool {
        self.dnd.is_dragging()
    }

    pub fn drag_motion(&mut self, time: u32) {
        self.dnd.motion(&mut self.ctx, time);
        self.pump();
    }

    /// `buttons` is the set still held after the change.
    pub fn drag_button(&mut self, buttons: ButtonMask) {
        self.dnd.button(&mut self.ctx, buttons);
        self.pump();
    }

    pub fn drag_touch_up(&mut self, slot: i32) {
        self.dnd.touch_up(&mut self.ctx, slot);
        self.pump();
    }

    pub fn drag_modifiers(&mut self, modifiers: Modifiers) {
        self.dnd.modifiers(&mut self.ctx, modifiers);
        self.pump();
    }

    pub fn drag_escape(&mut self) {
        self.dnd.escape(&mut self.ctx);
        self.pump();
    }

    /// Copy the current owner of `class` into `sink`, up to `max_bytes`.
    pub fn transfer(
        &self,
        class: SelectionClass,
        mime_type: MimeType,
        max_bytes: Option<u64>,
        sink: TransferSink,
    ) -> TransferHandle {
        let span = info_span!("selection.transfer", %class, mime = %mime_type, ?max_bytes);
        let transfer = Transfer::for_selection(&self.ctx, class, mime_type, max_bytes, sink);
        self.ctx.transfers.spawn(transfer, span)
    }

    pub fn transfer_from_source(
        &self,
        source: &SourceId,
        mime_type: MimeType,
        max_bytes: Option<u64>,
        sink: TransferSink,
    ) -> TransferHandle {
        let span = info_span!("selection.transfer", %source, mime = %mime_type, ?max_bytes);
        let transfer = Transfer::from_source(&self.ctx, Some(source), mime_type, max_bytes, sink);
        self.ctx.transfers.spawn(transfer, span)
    }

    pub fn get_mimetypes(&self, class: SelectionClass) -> Vec<MimeType> {
        self.ctx.get_mimetypes(class)
    }

    pub fn owner(&self, class: SelectionClass) -> Option<&SourceId> {
        self.ctx.owner(class)
    }

    pub fn subscribe_owner_changes(&self) -> broadcast::Receiver<OwnerChanged> {
        self.ctx.registry.subscribe()
    }

    pub fn clipboard_snapshot(&self) -> Option<ClipboardSnapshot> {
        self.persistence.snapshot()
    }

    /// Wait for every in-flight transfer and snapshot fetch, then apply
    /// what they completed.
    pub async fn wait_transfers(&mut self) {
        self.ctx.transfers.wait().await;
        self.pump();
    }

    /// Cancel every transfer, current and future.
    pub fn shutdown(&mut self) {
        info!(in_flight = self.ctx.transfers.in_flight(), "selection session shutting down");
        self.ctx.transfers.cancel_all();
    }

    fn guarded<T>(
        &mut self,
        client: &ClientId,
        request: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        let span = debug_span!("selection.session.request", %client, request);
        let _guard = span.enter();

        let result = op(self);
        if let Err(err) = &result {
            warn!(error = %err, "protocol error, terminating client");
            self.ctx.ports.events.post_error(client, err);
            self.terminate_client(client);
        }
        self.pump();
        result
    }

    fn handle_request(&mut self, client: &ClientId, request: Request) -> Result<(), ProtocolError> {
        match request {
            Request::BindDevice { device, protocol } => {
                if self.device_owner(&device).is_some() {
                    return Err(ProtocolError::DuplicateId {
                        kind: "device",
                        id: device.to_string(),
                    });
                }
                self.bind(client, device, protocol);
                Ok(())
            }
            Request::ReleaseDevice { device } => self.release_device_inner(client, &device),
            Request::CreateSource { source, protocol } => {
                self.create_source_inner(client, source, protocol)
            }
            Request::SourceOffer { source, mime_type } => {
                self.owned_source_mut(client, &source)?.add_mimetype(mime_type);
                Ok(())
            }
            Request::SourceSetActions { source, actions } => {
                let data_source = self.owned_source_mut(client, &source)?;
                if data_source.protocol() != WireProtocol::DataDevice {
                    return Err(ProtocolError::InvalidSource {
                        source_id: source,
                        reason: "primary selection sources carry no actions",
                    });
                }
                data_source.set_actions(actions)
            }
            Request::DestroySource { source } => {
                self.owned_source_mut(client, &source)?;
                self.destroy_source_inner(&source);
                Ok(())
            }
            Request::SetSelection {
                device,
                source,
                serial,
            } => self
                .set_selection_inner(client, &device, source.as_ref(), serial)
                .map(|_| ()),
            Request::StartDrag {
                device,
                source,
                origin,
                icon,
                serial,
            } => self
                .dnd
                .start_drag(
                    &mut self.ctx,
                    client,
                    &device,
                    source.as_ref(),
                    &origin,
                    icon.as_ref(),
                    serial,
                )
                .map(|_| ()),
            Request::OfferAccept {
                offer,
                serial,
                mime_type,
            } => data_offer::accept(&mut self.ctx, client, &offer, serial, mime_type),
            Request::OfferReceive {
                offer,
                mime_type,
                sink,
            } => data_offer::receive(&mut self.ctx, client, &offer, mime_type, sink).map(|_| ()),
            Request::OfferFinish { offer } => data_offer::finish(&mut self.ctx, client, &offer),
            Request::OfferSetActions {
                offer,
                supported,
                preferred,
            } => data_offer::set_actions(&mut self.ctx, client, &offer, supported, preferred),
            Request::DestroyOffer { offer } => data_offer::destroy(&mut self.ctx, client, &offer),
        }
    }

    fn bind(&mut self, client: &ClientId, device: DeviceId, protocol: WireProtocol) {
        debug!(%client, %device, ?protocol, "device bound");
        let focused = self.ctx.ports.focus.focused_client().as_ref() == Some(client);
        match protocol {
            WireProtocol::DataDevice => {
                self.clipboard.bind(client, device.clone());
                self.dnd.bind(client, device.clone());
                if focused {
                    self.clipboard.offer_to_device(&mut self.ctx, client, &device);
                }
            }
            WireProtocol::PrimarySelection => {
                self.primary.bind(client, device.clone());
                if focused {
                    self.primary.offer_to_device(&mut self.ctx, client, &device);
                }
            }
        }
    }

    fn device_owner(&self, device: &DeviceId) -> Option<&ClientId> {
        self.clipboard
            .client_of(device)
            .or_else(|| self.primary.client_of(device))
    }

    fn release_device_inner(&mut self, client: &ClientId, device: &DeviceId) -> Result<(), ProtocolError> {
        if self.device_owner(device) != Some(client) {
            return Err(ProtocolError::unknown("device", device));
        }
        self.clipboard.release(device);
        self.dnd.release(device);
        self.primary.release(device);
        for offer in self.ctx.offers.remove_device(device) {
            data_offer::abandon(&mut self.ctx, &offer);
        }
        debug!(%client, %device, "device released");
        Ok(())
    }

    fn create_source_inner(
        &mut self,
        client: &ClientId,
        source: SourceId,
        protocol: WireProtocol,
    ) -> Result<(), ProtocolError> {
        if self.ctx.sources.contains(&source) {
            return Err(ProtocolError::DuplicateId {
                kind: "source",
                id: source.to_string(),
            });
        }
        let backend = ClientSourceBackend::new(
            client.clone(),
            source.clone(),
            protocol,
            Arc::clone(&self.ctx.ports.events),
            Arc::clone(&self.ctx.ports.streams),
        );
        debug!(%client, %source, ?protocol, "data source created");
        self.ctx.sources.insert(DataSource::new(
            source,
            Some(client.clone()),
            protocol,
            Arc::new(backend),
        ));
        Ok(())
    }

    fn owned_source_mut(
        &mut self,
        client: &ClientId,
        source: &SourceId,
    ) -> Result<&mut DataSource, ProtocolError> {
        self.ctx
            .sources
            .get_mut(source)
            .filter(|found| found.client() == Some(client))
            .ok_or_else(|| ProtocolError::unknown("source", source))
    }

    fn destroy_source_inner(&mut self, source: &SourceId) {
        self.ctx.destroy_source(source);
        self.dnd.source_destroyed(&mut self.ctx, source);
    }

    fn set_selection_inner(
        &mut self,
        client: &ClientId,
        device: &DeviceId,
        source: Option<&SourceId>,
        serial: Serial,
    ) -> Result<SetSelectionOutcome, ProtocolError> {
        if self.clipboard.client_of(device) == Some(client) {
            self.clipboard
                .set_selection(&mut self.ctx, client, source, serial)
        } else if self.primary.client_of(device) == Some(client) {
            self.primary
                .set_selection(&mut self.ctx, client, source, serial)
        } else {
            Err(ProtocolError::unknown("device", device))
        }
    }

    fn terminate_client(&mut self, client: &ClientId) {
        for source in self.ctx.sources.owned_by(client) {
            self.destroy_source_inner(&source);
        }
        self.dnd.remove_client(&mut self.ctx, client);
        for offer in self.ctx.offers.remove_client(client) {
            data_offer::abandon(&mut self.ctx, &offer);
        }
        self.clipboard.remove_client(client);
        self.primary.remove_client(client);
        if self.focus.as_ref() == Some(client) {
            self.focus = None;
        }
        debug!(%client, "client state released");
    }

    fn complete(&mut self, completion: TaskCompletion) {
        debug!(?completion, "task completion applied");
        match completion {
            TaskCompletion::DesktopDropFinished(source) => {
                if let Some(data_source) = self.ctx.sources.get_mut(&source) {
                    data_source.notify_finish();
                }
            }
            TaskCompletion::DesktopDropFailed(source) => {
                if let Some(data_source) = self.ctx.sources.get_mut(&source) {
                    data_source.cancel();
                }
            }
            TaskCompletion::SnapshotCached => {
                self.persistence.on_snapshot_cached(&mut self.ctx);
            }
        }
    }

    /// Apply task completions, then deliver queued owner changes.
    /// Persistence runs first so that a placeholder it installs supersedes
    /// the empty selection.
    fn pump(&mut self) {
        while let Some(completion) = self.ctx.completions.try_next() {
            self.complete(completion);
        }
        while let Some(change) = self.ctx.registry.next_change() {
            debug!(class = %change.class, owner = ?change.owner, "owner change delivered");
            match change.class {
                SelectionClass::Clipboard => {
                    self.persistence.on_owner_changed(&mut self.ctx, &change);
                    self.clipboard.on_owner_changed(&mut self.ctx, &change);
                }
                SelectionClass::Primary => self.primary.on_owner_changed(&mut self.ctx, &change),
                SelectionClass::DragAndDrop => {}
            }
        }
    }
}
