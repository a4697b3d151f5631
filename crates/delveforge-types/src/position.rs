//! World coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tile in the persistent world: `x`, `y` and a floor `z`.
///
/// The all-zero position is the "unset" marker. Instance blueprints leave
/// their exit at `(0, 0, 0)` to mean "send players to their home temple".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u16,
    pub y: u16,
    pub z: u8,
}

impl Position {
    /// Highest valid floor.
    pub const MAX_FLOOR: u8 = 15;

    pub const fn new(x: u16, y: u16, z: u8) -> Self {
        Self { x, y, z }
    }

    /// `true` for the all-zero "unset" marker.
    pub fn is_unset(&self) -> bool {
        self.x == 0 && self.y == 0 && self.z == 0
    }

    /// `true` if this position can be used as a relocation target.
    pub fn is_valid(&self) -> bool {
        !self.is_unset() && self.z <= Self::MAX_FLOOR
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset_and_invalid() {
        let pos = Position::default();
        assert!(pos.is_unset());
        assert!(!pos.is_valid());
    }

    #[test]
    fn test_floor_above_max_is_invalid() {
        assert!(Position::new(100, 100, 7).is_valid());
        assert!(!Position::new(100, 100, 16).is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(50, 50, 7).to_string(), "(50, 50, 7)");
    }
}
