//! Error types for the instance layer.
//!
//! The `Display` text of each variant is the reason string shown to the
//! player or command issuer, so it is kept short and stable.

use delveforge_types::{InstanceId, PlayerId};
use delveforge_world::{RelocateOutcome, WorldError};

/// Why an instance operation declined to proceed.
///
/// None of these are fatal. Multi-step operations (party binds,
/// teleports) have already unwound their partial work by the time the
/// caller sees the error.
#[derive(Debug, thiserror::Error)]
pub enum InstanceError {
    /// The player GUID does not resolve to a connected player.
    #[error("invalid player")]
    InvalidPlayer(PlayerId),

    /// No open instance has this identifier.
    #[error("instance not found")]
    NotFound(InstanceId),

    /// The player's level is below the instance minimum.
    #[error("requires level {required}")]
    LevelTooLow {
        player: PlayerId,
        level: u32,
        required: u32,
    },

    /// The player is already a member of another open instance.
    #[error("already bound to a different instance")]
    AlreadyBound {
        player: PlayerId,
        current: InstanceId,
    },

    /// The instance's map template could not be merged into the world.
    #[error("failed to load map template {template}: {source}")]
    MapLoad {
        template: String,
        #[source]
        source: WorldError,
    },

    /// The relocation engine refused the move. Displays the engine's
    /// own message.
    #[error("{0}")]
    Relocation(RelocateOutcome),
}

/// Coarse classification of an [`InstanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Eligibility,
    Resource,
    Engine,
}

impl InstanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPlayer(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::LevelTooLow { .. } | Self::AlreadyBound { .. } => ErrorKind::Eligibility,
            Self::MapLoad { .. } => ErrorKind::Resource,
            Self::Relocation(_) => ErrorKind::Engine,
        }
    }

    /// The player the error is about, when there is one.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            Self::InvalidPlayer(player)
            | Self::LevelTooLow { player, .. }
            | Self::AlreadyBound { player, .. } => Some(*player),
            _ => None,
        }
    }
}
