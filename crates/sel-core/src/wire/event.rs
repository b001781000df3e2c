use serde::{Deserialize, Serialize};

use crate::ids::{DeviceId, OfferId, Serial, SourceId, SurfaceId};
use crate::selection::{DndAction, MimeType};

/// Protocol a device, source or offer was created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireProtocol {
    /// Core data device: clipboard selection and drag-and-drop.
    DataDevice,
    /// Primary selection device: primary selection only.
    PrimarySelection,
}

/// A notification delivered to one client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WireEvent {
    /// A new offer object is introduced on a device.
    DataOffer {
        protocol: WireProtocol,
        device: DeviceId,
        offer: OfferId,
    },
    /// One mimetype line of an offer.
    Offer {
        protocol: WireProtocol,
        offer: OfferId,
        mime_type: MimeType,
    },
    /// Selection changed; `None` means the selection is empty.
    Selection {
        protocol: WireProtocol,
        device: DeviceId,
        offer: Option<OfferId>,
    },
    Enter {
        device: DeviceId,
        serial: Serial,
        surface: SurfaceId,
        x: f64,
        y: f64,
        offer: Option<OfferId>,
    },
    Leave {
        device: DeviceId,
    },
    Motion {
        device: DeviceId,
        time: u32,
        x: f64,
        y: f64,
    },
    Drop {
        device: DeviceId,
    },
    /// Actions the drag source supports, sent with a drag offer.
    SourceActions {
        offer: OfferId,
        actions: DndAction,
    },
    /// Negotiated action, toward the destination.
    Action {
        offer: OfferId,
        action: DndAction,
    },
    /// Destination accepted (or stopped accepting) a mimetype.
    Target {
        source: SourceId,
        mime_type: Option<MimeType>,
    },
    /// The source lost its selection or its drag failed.
    Cancelled {
        protocol: WireProtocol,
        source: SourceId,
    },
    /// Negotiated action, toward the source.
    SourceAction {
        source: SourceId,
        action: DndAction,
    },
    DndDropPerformed {
        source: SourceId,
    },
    DndFinished {
        source: SourceId,
    },
}
