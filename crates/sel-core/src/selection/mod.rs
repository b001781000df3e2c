//! Selection domain models.
mod action;
mod class;
mod mime;

pub use action::{ButtonMask, DndAction, Modifiers};
pub use class::SelectionClass;
pub use mime::MimeType;
