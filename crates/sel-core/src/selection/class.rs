use serde::{Deserialize, Serialize};
use std::fmt;

/// Named selection slot. Fixed and exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionClass {
    Primary,
    Clipboard,
    DragAndDrop,
}

impl SelectionClass {
    pub const ALL: [SelectionClass; 3] = [
        SelectionClass::Primary,
        SelectionClass::Clipboard,
        SelectionClass::DragAndDrop,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            SelectionClass::Primary => 0,
            SelectionClass::Clipboard => 1,
            SelectionClass::DragAndDrop => 2,
        }
    }

    /// Whether losing ownership of this class is reported to the source.
    pub fn cancels_on_loss(self) -> bool {
        !matches!(self, SelectionClass::DragAndDrop)
    }
}

impl fmt::Display for SelectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectionClass::Primary => "primary",
            SelectionClass::Clipboard => "clipboard",
            SelectionClass::DragAndDrop => "dnd",
        };
        f.write_str(name)
    }
}
