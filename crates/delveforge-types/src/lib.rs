//! Shared vocabulary for Delveforge.
//!
//! Every other crate in the workspace speaks in terms of these types:
//!
//! - [`PlayerId`]: the stable GUID of a player character
//! - [`InstanceId`]: the identifier of one live instance zone
//! - [`Position`]: a tile coordinate in the persistent world
//!
//! Nothing here knows about the registry, the world, or the game loop.
//! Keeping them in a leaf crate lets the world contracts and the instance
//! manager agree on identities without depending on each other.

mod ids;
mod position;

pub use ids::{InstanceId, PlayerId};
pub use position::Position;
