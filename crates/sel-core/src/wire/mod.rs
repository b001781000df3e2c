//! Wire-level vocabulary: the notifications sent to clients, the requests
//! received from them, and the framing strategies that map the shared
//! selection-device lifecycle onto a concrete protocol.

mod event;
mod framing;
mod request;

pub use event::{WireEvent, WireProtocol};
pub use framing::{DataDeviceWire, PrimarySelectionWire, SelectionWire};
pub use request::Request;
