//! # sel-app
//!
//! Stateful side of selkit: the selection session, the clipboard, primary
//! and drag-and-drop devices, the transfer pipeline and clipboard
//! persistence. Everything here runs against the ports of `sel-core`.

pub mod context;
pub mod data_offer;
pub mod devices;
pub mod persistence;
pub mod session;
pub mod sources;
pub mod transfer;

pub use context::{CompletionQueue, SelectionContext, SessionPorts, TaskCompletion};
pub use devices::SetSelectionOutcome;
pub use persistence::{ClipboardPersistence, MemorySourceBackend};
pub use session::{SelectionSession, TransferHandle};
pub use transfer::{MemorySink, Transfer, TransferRunner};
