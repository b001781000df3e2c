//! Headless port adapters.
//!
//! In-memory stand-ins for the compositor: a recording wire transport, a
//! payload table playing the part of source clients, and a scripted seat.

mod events;
mod seat;
mod streams;

pub use events::RecordingClientEvents;
pub use seat::{HeadlessSeat, SurfaceRect};
pub use streams::InMemorySourceStreams;
