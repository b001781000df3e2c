//! Error taxonomy.
//!
//! - [`ProtocolError`]: a client sent a malformed or out-of-order request.
//!   The request is refused and the client connection is terminated.
//! - [`TransferError`]: one transfer failed. Only that transfer is affected;
//!   the sink is closed and selection ownership is unchanged.

use thiserror::Error;

use crate::ids::SourceId;
use crate::selection::{DndAction, MimeType, SelectionClass};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid action mask {0:#x}")]
    InvalidActionMask(u32),

    #[error("preferred action {preferred:?} is not a single action within {supported:?}")]
    InvalidAction {
        supported: DndAction,
        preferred: DndAction,
    },

    #[error("data source actions can only be set once")]
    ActionsAlreadySet,

    #[error("data source actions cannot change once the drag started")]
    DragAlreadyStarted,

    #[error("finish requested before a mimetype was accepted and an action was chosen")]
    PrematureFinish,

    #[error("source {source_id} cannot be used here: {reason}")]
    InvalidSource {
        source_id: SourceId,
        reason: &'static str,
    },

    #[error("{0} selection can only be set by the keyboard-focused client")]
    NotFocused(SelectionClass),

    #[error("request is only valid on drag-and-drop offers")]
    NotDragAndDrop,

    #[error("unknown {kind} {id}")]
    UnknownObject { kind: &'static str, id: String },

    #[error("{kind} id {id} is already in use")]
    DuplicateId { kind: &'static str, id: String },
}

impl ProtocolError {
    pub fn unknown(kind: &'static str, id: impl ToString) -> Self {
        ProtocolError::UnknownObject {
            kind,
            id: id.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("no owner for the {0} selection")]
    NoOwner(SelectionClass),

    #[error("selection owner does not offer {0}")]
    Rejected(MimeType),

    #[error("data source does not offer {0}")]
    NotOffered(MimeType),

    #[error("data source is no longer available")]
    Unavailable,

    #[error("transfer cancelled")]
    Cancelled,

    #[error("transfer I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
