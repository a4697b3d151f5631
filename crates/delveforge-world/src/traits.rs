//! The collaborator traits.
//!
//! All methods are synchronous. The instance manager runs on the game
//! task and expects every call here to complete without suspending.

use std::path::Path;

use delveforge_types::{InstanceId, PlayerId, Position};

use crate::{PlayerInfo, RelocateOutcome, WorldError};

/// Loads instance map templates into the shared world.
pub trait MapLoader {
    /// Whether a template file exists at `path`.
    ///
    /// The default probes the local filesystem.
    fn template_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Merges the map file at `path` into the base world.
    ///
    /// Only called once per template per process; implementations do not
    /// need to be idempotent.
    fn merge_map_file(&mut self, path: &Path) -> Result<(), WorldError>;
}

/// Moves players around the world.
pub trait Relocator {
    /// Moves `player` to `target`.
    ///
    /// With `must_be_online` set, an offline player yields
    /// [`RelocateOutcome::PlayerOffline`] instead of a position update on
    /// the stored character.
    fn relocate(
        &mut self,
        player: PlayerId,
        target: Position,
        must_be_online: bool,
    ) -> RelocateOutcome;
}

/// Lookup and mutation of player entities by GUID.
pub trait PlayerDirectory {
    /// Resolves a GUID to a connected player. `None` if offline or unknown.
    fn resolve(&self, player: PlayerId) -> Option<PlayerInfo>;

    /// The other members of `player`'s party, in party order.
    ///
    /// `None` if the player is not in a party.
    fn party_members(&self, player: PlayerId) -> Option<Vec<PlayerId>>;

    /// Writes the player's instance back-reference.
    fn set_instance(&mut self, player: PlayerId, instance: Option<InstanceId>);

    /// Delivers a text notice to the player.
    fn send_notice(&mut self, player: PlayerId, text: &str);
}

/// Everything the instance manager needs from the game server.
///
/// Blanket-implemented for any type providing the three collaborator
/// traits.
pub trait World: MapLoader + Relocator + PlayerDirectory {}

impl<T: MapLoader + Relocator + PlayerDirectory> World for T {}
