use crate::geometry::Point;
use crate::ids::{Serial, SurfaceId};
use crate::selection::{ButtonMask, Modifiers};

/// Input device holding the press grab a drag was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabDevice {
    /// A pointer button press.
    Pointer,
    /// A touch point, identified by its slot.
    Touch { slot: i32 },
}

/// Seat input state and grab control.
pub trait GrabPort: Send + Sync {
    /// Return the device of the active press grab on `origin` whose
    /// serial matches, or `None` when no such grab exists.
    fn press_grab(&self, origin: &SurfaceId, serial: Serial) -> Option<GrabDevice>;

    /// Pointer position (or grabbing touch point) in global coordinates.
    fn pointer_position(&self) -> Point;

    fn modifiers(&self) -> Modifiers;

    fn buttons(&self) -> ButtonMask;

    /// Redirect motion, button and key input to the drag.
    fn begin_drag_grab(&self, device: GrabDevice);

    /// Restore normal input dispatch.
    fn end_drag_grab(&self);
}
