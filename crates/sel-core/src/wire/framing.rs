use crate::ids::{DeviceId, OfferId};
use crate::selection::{MimeType, SelectionClass};

use super::{WireEvent, WireProtocol};

/// Stateless framing of the selection-device lifecycle onto one protocol.
///
/// The clipboard and primary devices share all lifecycle logic; only the
/// protocol tag and the class they serve differ.
pub trait SelectionWire: Send + Sync {
    fn protocol(&self) -> WireProtocol;

    fn class(&self) -> SelectionClass;

    /// Introduce `offer` on `device` followed by one line per mimetype.
    fn announce(&self, device: &DeviceId, offer: &OfferId, mime_types: &[MimeType]) -> Vec<WireEvent> {
        let protocol = self.protocol();
        let mut events = Vec::with_capacity(mime_types.len() + 1);
        events.push(WireEvent::DataOffer {
            protocol,
            device: device.clone(),
            offer: offer.clone(),
        });
        events.extend(mime_types.iter().map(|mime_type| WireEvent::Offer {
            protocol,
            offer: offer.clone(),
            mime_type: mime_type.clone(),
        }));
        events
    }

    fn selection(&self, device: &DeviceId, offer: Option<OfferId>) -> WireEvent {
        WireEvent::Selection {
            protocol: self.protocol(),
            device: device.clone(),
            offer,
        }
    }
}

/// Core data device framing, serving the clipboard selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataDeviceWire;

impl SelectionWire for DataDeviceWire {
    fn protocol(&self) -> WireProtocol {
        WireProtocol::DataDevice
    }

    fn class(&self) -> SelectionClass {
        SelectionClass::Clipboard
    }
}

/// Primary selection device framing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimarySelectionWire;

impl SelectionWire for PrimarySelectionWire {
    fn protocol(&self) -> WireProtocol {
        WireProtocol::PrimarySelection
    }

    fn class(&self) -> SelectionClass {
        SelectionClass::Primary
    }
}
