//! Teleport transaction: bind, ready the map, move.

use delveforge_types::{InstanceId, PlayerId};
use delveforge_world::World;

use crate::{InstanceError, InstanceManager};

impl InstanceManager {
    /// Binds `player` to instance `id` and moves them to its entry.
    ///
    /// Steps, in order: bind, make the map template ready, relocate to the
    /// entry position. If the map or relocation step fails the player is
    /// unbound before the error is returned, even if they were a member
    /// before the call, so a failed teleport never leaves a player bound
    /// but not moved.
    ///
    /// # Errors
    /// - any [`bind_player`](Self::bind_player) error, unchanged
    /// - [`InstanceError::MapLoad`] if the template cannot be merged
    /// - [`InstanceError::Relocation`] carrying the engine's outcome
    pub fn teleport_into<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        id: InstanceId,
        player: PlayerId,
    ) -> Result<(), InstanceError> {
        self.bind_player(world, player, id)?;

        let Some((template, entry)) = self
            .instances
            .get(&id)
            .map(|instance| (instance.map_template.clone(), instance.entry))
        else {
            return Err(InstanceError::NotFound(id));
        };

        if let Err(e) = self.maps.ensure_loaded(world, &template) {
            tracing::warn!(
                instance_id = %id,
                player_id = %player,
                reason = %e,
                "teleport aborted: map template not ready"
            );
            self.player_leave(world, player);
            return Err(e);
        }

        let outcome = world.relocate(player, entry, true);
        if !outcome.is_success() {
            tracing::warn!(
                instance_id = %id,
                player_id = %player,
                %entry,
                reason = %outcome,
                "teleport aborted: relocation refused"
            );
            self.player_leave(world, player);
            return Err(InstanceError::Relocation(outcome));
        }

        tracing::info!(instance_id = %id, player_id = %player, %entry, "player teleported in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::SystemTime;

    use delveforge_types::Position;
    use delveforge_world::memory::MemoryWorld;
    use delveforge_world::{ManualClock, RelocateOutcome};

    use super::*;
    use crate::{InstanceConfig, ManagerConfig};

    const HOME: Position = Position::new(32, 32, 7);
    const ENTRY: Position = Position::new(100, 100, 7);

    fn setup(template: &str) -> (InstanceManager, MemoryWorld, InstanceId) {
        let config = ManagerConfig {
            maps_dir: PathBuf::from("maps"),
            ..ManagerConfig::default()
        };
        let mut mgr =
            InstanceManager::with_clock(config, ManualClock::new(SystemTime::UNIX_EPOCH));
        let mut world = MemoryWorld::new();
        world.add_player(PlayerId(1), 30, HOME);
        let id = mgr
            .create(
                &mut world,
                InstanceConfig {
                    name: "Crypt".into(),
                    map_template: template.into(),
                    entry: ENTRY,
                    ..Default::default()
                },
            )
            .unwrap();
        (mgr, world, id)
    }

    #[test]
    fn test_teleport_moves_to_entry() {
        let (mut mgr, mut world, id) = setup("");

        mgr.teleport_into(&mut world, id, PlayerId(1)).unwrap();

        assert_eq!(world.position_of(PlayerId(1)), Some(ENTRY));
        assert!(mgr.is_player_bound(PlayerId(1), id));
    }

    #[test]
    fn test_bind_failure_returned_unchanged() {
        let (mut mgr, mut world, _) = setup("");

        let err = mgr
            .teleport_into(&mut world, InstanceId(42), PlayerId(1))
            .unwrap_err();

        assert_eq!(err.to_string(), "instance not found");
        assert_eq!(world.position_of(PlayerId(1)), Some(HOME));
    }

    #[test]
    fn test_relocation_failure_unbinds_and_surfaces_engine_message() {
        let (mut mgr, mut world, id) = setup("");
        world.block(ENTRY, RelocateOutcome::Other("the entrance is sealed".into()));

        let err = mgr.teleport_into(&mut world, id, PlayerId(1)).unwrap_err();

        assert_eq!(err.to_string(), "the entrance is sealed");
        assert!(!mgr.is_player_bound(PlayerId(1), id));
        assert_eq!(world.instance_of(PlayerId(1)), None);
        assert_eq!(world.position_of(PlayerId(1)), Some(HOME));
    }

    #[test]
    fn test_map_failure_after_create_unbinds() {
        // Templates are resolved at creation; swap in an unresolved one
        // to reach the teleport-time map step.
        let (mut mgr, mut world, id) = setup("");
        if let Some(instance) = mgr.instances.get_mut(&id) {
            instance.map_template = "vault".into();
        }
        world.add_broken_template("maps/vault.otbm");

        let err = mgr.teleport_into(&mut world, id, PlayerId(1)).unwrap_err();

        assert!(matches!(err, InstanceError::MapLoad { .. }));
        assert!(!mgr.is_player_bound(PlayerId(1), id));
        assert_eq!(world.position_of(PlayerId(1)), Some(HOME));
    }

    #[test]
    fn test_failed_teleport_unbinds_player_bound_beforehand() {
        let (mut mgr, mut world, id) = setup("");
        mgr.bind_player(&mut world, PlayerId(1), id).unwrap();
        world.block(ENTRY, RelocateOutcome::DestinationOccupied);

        let err = mgr.teleport_into(&mut world, id, PlayerId(1)).unwrap_err();

        assert_eq!(err.to_string(), "there is not enough room");
        assert!(!mgr.is_player_bound(PlayerId(1), id));
        assert_eq!(mgr.instance_of(PlayerId(1)), None);
        assert_eq!(world.instance_of(PlayerId(1)), None);
        assert_eq!(world.position_of(PlayerId(1)), Some(HOME));
    }
}
