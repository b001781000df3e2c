use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

bitflags! {
    /// Drag-and-drop actions. The empty set is "none".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DndAction: u32 {
        const COPY = 1;
        const MOVE = 2;
        const ASK = 4;
    }
}

impl DndAction {
    pub const NONE: DndAction = DndAction::empty();

    /// Parse a mask received from a client. Unknown bits are a protocol error.
    pub fn from_wire(mask: u32) -> Result<Self, ProtocolError> {
        DndAction::from_bits(mask).ok_or(ProtocolError::InvalidActionMask(mask))
    }

    /// Exactly one action bit is set.
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }

    /// The lowest-ordinal action in the set, or none.
    pub fn lowest(self) -> DndAction {
        if self.is_empty() {
            return DndAction::NONE;
        }
        DndAction::from_bits_truncate(1 << self.bits().trailing_zeros())
    }
}

bitflags! {
    /// Keyboard modifiers relevant to drag-and-drop.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Modifiers: u32 {
        const SHIFT = 1;
        const CONTROL = 1 << 2;
        const ALT = 1 << 3;
    }
}

bitflags! {
    /// Pointer buttons currently held.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ButtonMask: u32 {
        const PRIMARY = 1;
        const MIDDLE = 1 << 1;
        const SECONDARY = 1 << 2;
    }
}

impl Modifiers {
    /// Action forced by the user through modifiers (and the secondary
    /// button). Shift wins over Control, Control over Alt.
    pub fn user_action(self, buttons: ButtonMask) -> DndAction {
        if self.contains(Modifiers::SHIFT) {
            DndAction::MOVE
        } else if self.contains(Modifiers::CONTROL) {
            DndAction::COPY
        } else if self.contains(Modifiers::ALT) || buttons.contains(ButtonMask::SECONDARY) {
            DndAction::ASK
        } else {
            DndAction::NONE
        }
    }
}
