//! Ports toward the compositor and its clients.
//!
//! The broker never touches a socket, an input device or a scene graph
//! directly. Everything it needs from the outside world comes through these
//! traits so that the session can be driven headless in tests.

mod client_events;
mod focus;
mod grab;
mod source_backend;
mod visual;


pub use client_events::ClientEventPort;
pub use focus::KeyboardFocusPort;
pub use grab::{GrabDevice, GrabPort};
pub use source_backend::{DataSourceBackend, SourceStream, SourceStreamPort, TransferSink};
pub use visual::{SurfaceHit, VisualLayerPort};
