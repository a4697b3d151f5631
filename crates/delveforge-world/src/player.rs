//! Player snapshots and relocation outcomes.

use std::fmt;

use delveforge_types::{InstanceId, PlayerId, Position};

/// What the instance manager can see of a connected player.
///
/// This is a copy taken at the moment of the call, not a handle. The
/// manager never keeps one across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub level: u32,
    /// The player's instance back-reference. `None` means the player is
    /// in the persistent world.
    pub instance: Option<InstanceId>,
    /// The player's home temple, the fallback eviction target.
    pub home: Position,
}

/// Result code of a relocation attempt.
///
/// [`RelocateOutcome::NoError`] is the only success value; every other
/// variant renders a human-readable message through `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocateOutcome {
    NoError,
    NotPossible,
    PlayerOffline,
    DestinationOccupied,
    Other(String),
}

impl RelocateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::NoError)
    }
}

impl fmt::Display for RelocateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoError => write!(f, "no error"),
            Self::NotPossible => write!(f, "sorry, not possible"),
            Self::PlayerOffline => write!(f, "player is not online"),
            Self::DestinationOccupied => write!(f, "there is not enough room"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}
