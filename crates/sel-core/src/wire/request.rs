use crate::ids::{DeviceId, OfferId, Serial, SourceId, SurfaceId};
use crate::ports::TransferSink;
use crate::selection::MimeType;

use super::WireProtocol;

/// A request received from one client.
///
/// New objects carry their id in the request, the way the client allocates
/// ids on the wire.
pub enum Request {
    BindDevice {
        device: DeviceId,
        protocol: WireProtocol,
    },
    ReleaseDevice {
        device: DeviceId,
    },
    CreateSource {
        source: SourceId,
        protocol: WireProtocol,
    },
    SourceOffer {
        source: SourceId,
        mime_type: MimeType,
    },
    SourceSetActions {
        source: SourceId,
        actions: u32,
    },
    DestroySource {
        source: SourceId,
    },
    SetSelection {
        device: DeviceId,
        source: Option<SourceId>,
        serial: Serial,
    },
    StartDrag {
        device: DeviceId,
        source: Option<SourceId>,
        origin: SurfaceId,
        icon: Option<SurfaceId>,
        serial: Serial,
    },
    OfferAccept {
        offer: OfferId,
        serial: Serial,
        mime_type: Option<MimeType>,
    },
    OfferReceive {
        offer: OfferId,
        mime_type: MimeType,
        sink: TransferSink,
    },
    OfferFinish {
        offer: OfferId,
    },
    OfferSetActions {
        offer: OfferId,
        supported: u32,
        preferred: u32,
    },
    DestroyOffer {
        offer: OfferId,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::BindDevice { .. } => "bind_device",
            Request::ReleaseDevice { .. } => "release_device",
            Request::CreateSource { .. } => "create_source",
            Request::SourceOffer { .. } => "source.offer",
            Request::SourceSetActions { .. } => "source.set_actions",
            Request::DestroySource { .. } => "source.destroy",
            Request::SetSelection { .. } => "set_selection",
            Request::StartDrag { .. } => "start_drag",
            Request::OfferAccept { .. } => "offer.accept",
            Request::OfferReceive { .. } => "offer.receive",
            Request::OfferFinish { .. } => "offer.finish",
            Request::OfferSetActions { .. } => "offer.set_actions",
            Request::DestroyOffer { .. } => "offer.destroy",
        }
    }
}
