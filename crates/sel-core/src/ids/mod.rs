//! ID type wrappers for type safety.
//!
//! Handles are never reused: a handle that outlived its object resolves to
//! "not found" in the owning store instead of aliasing a newer object.

mod handles;
mod id_macro;
mod serial;

pub use handles::{ClientId, DeviceId, OfferId, SourceId, SurfaceId};
pub use serial::Serial;
