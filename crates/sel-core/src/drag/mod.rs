//! Drag grab.
//!
//! The grab itself is a pure state machine; the drag-and-drop device in
//! `sel-app` applies the actions it produces.

mod state_machine;

pub use state_machine::{DragAction, DragEvent, DragFocus, DragOutcome, DragState, DragStateMachine};
