//! Identity newtypes.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PlayerId
// ---------------------------------------------------------------------------

/// The persistent GUID of a player character.
///
/// Instances store these, never references to player entities. A player
/// who logs out between ticks simply stops resolving; nothing inside an
/// instance is left dangling.
///
/// `#[serde(transparent)]` keeps the wire/config form a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// InstanceId
// ---------------------------------------------------------------------------

/// Identifier of one live instance.
///
/// Allocated by the registry starting at 1 and never reused within a
/// process lifetime, so `InstanceId(0)` never names a live instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl InstanceId {
    /// The first identifier a fresh registry hands out.
    pub const FIRST: InstanceId = InstanceId(1);

    /// The identifier that follows this one.
    pub fn next(self) -> InstanceId {
        InstanceId(self.0.wrapping_add(1).max(1))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I-{}", self.0)
    }
}
