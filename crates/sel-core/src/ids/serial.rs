use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonically increasing request counter, compared with wrap-around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Serial(pub u32);

impl Serial {
    /// `true` if `self` was issued before `other`.
    ///
    /// Serials wrap, so "older" means `other` is at most half the counter
    /// space ahead of `self`.
    pub fn is_older_than(self, other: Serial) -> bool {
        let distance = other.0.wrapping_sub(self.0);
        distance != 0 && distance < u32::MAX / 2
    }
}

impl From<u32> for Serial {
    fn from(value: u32) -> Self {
        Serial(value)
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
