//! Protocol devices: the per-client endpoints of the clipboard, primary
//! selection and drag-and-drop.

mod dnd;
mod selection;

pub use dnd::DndDevice;
pub use selection::{SelectionDevice, SetSelectionOutcome};

use sel_core::{ClientId, DeviceId};

/// Live device handles of one protocol, in bind order.
#[derive(Debug, Default)]
pub struct BoundDevices {
    devices: Vec<(DeviceId, ClientId)>,
}

impl BoundDevices {
    pub fn bind(&mut self, client: ClientId, device: DeviceId) {
        if self.client_of(&device).is_none() {
            self.devices.push((device, client));
        }
    }

    pub fn release(&mut self, device: &DeviceId) -> Option<ClientId> {
        let index = self.devices.iter().position(|(id, _)| id == device)?;
        Some(self.devices.remove(index).1)
    }

    pub fn remove_client(&mut self, client: &ClientId) -> Vec<DeviceId> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.devices)
            .into_iter()
            .partition(|(_, owner)| owner == client);
        self.devices = kept;
        removed.into_iter().map(|(device, _)| device).collect()
    }

    pub fn client_of(&self, device: &DeviceId) -> Option<&ClientId> {
        self.devices
            .iter()
            .find(|(id, _)| id == device)
            .map(|(_, client)| client)
    }

    pub fn devices_of(&self, client: &ClientId) -> Vec<DeviceId> {
        self.devices
            .iter()
            .filter(|(_, owner)| owner == client)
            .map(|(device, _)| device.clone())
            .collect()
    }

    /// Oldest device bound by `client`.
    pub fn first_of(&self, client: &ClientId) -> Option<DeviceId> {
        self.devices
            .iter()
            .find(|(_, owner)| owner == client)
            .map(|(device, _)| device.clone())
    }
}
