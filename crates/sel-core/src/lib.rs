//! # sel-core
//!
//! Core domain models and policies for selkit, the compositor-side
//! selection and drag-and-drop broker.
//!
//! This crate contains pure state and rules without any runtime wiring:
//! the selection registry, data sources, data offers, action negotiation,
//! the drag state machine and the clipboard snapshot policy. Everything that
//! touches the outside world (focus, grabs, visuals, client transport) is a
//! port in [`ports`].

pub mod config;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod offer;
pub mod persistence;
pub mod ports;
pub mod registry;
pub mod selection;
pub mod source;
pub mod wire;

// Re-export commonly used types at the crate root
pub use config::SessionConfig;
pub use error::{ProtocolError, TransferError};
pub use geometry::Point;
pub use ids::{ClientId, DeviceId, OfferId, Serial, SourceId, SurfaceId};
pub use offer::{DataOffer, OfferStore};
pub use registry::{OwnerChanged, SelectionRegistry};
pub use selection::{ButtonMask, DndAction, MimeType, Modifiers, SelectionClass};
pub use source::{DataSource, SourceStore, SourceUsage};
pub use wire::{WireEvent, WireProtocol};
