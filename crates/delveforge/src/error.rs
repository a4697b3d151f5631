//! Unified error types for Delveforge.

use delveforge_instance::InstanceError;
use delveforge_world::WorldError;

use crate::ConfigError;

/// Errors returned by an [`InstanceHandle`](crate::InstanceHandle).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The game task has stopped or its command queue is closed.
    #[error("instance service is unavailable")]
    Unavailable,

    /// The operation ran and the instance manager declined it.
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

impl ServiceError {
    /// The instance-level error, if the operation reached the manager.
    pub fn as_instance(&self) -> Option<&InstanceError> {
        match self {
            Self::Instance(e) => Some(e),
            Self::Unavailable => None,
        }
    }
}

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DelveforgeError {
    /// An instance lifecycle operation was declined.
    #[error(transparent)]
    Instance(#[from] InstanceError),

    /// The host world failed (map merge, I/O).
    #[error(transparent)]
    World(#[from] WorldError),

    /// The game task could not be reached.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
