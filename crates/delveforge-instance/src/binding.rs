//! Binding coordinator: attaching players and parties to instances.

use std::collections::HashSet;

use delveforge_types::{InstanceId, PlayerId};
use delveforge_world::PlayerDirectory;

use crate::{InstanceError, InstanceManager};

impl InstanceManager {
    /// Binds `player` to instance `id`.
    ///
    /// Checks run in this order: the player resolves, the instance exists,
    /// the level requirement holds, and the player is not a member of a
    /// different open instance. Binding to the instance the player is
    /// already in succeeds and changes nothing.
    ///
    /// On success the player is added to the member set and the player's
    /// back-reference is set to `id`.
    pub fn bind_player<W: PlayerDirectory + ?Sized>(
        &mut self,
        world: &mut W,
        player: PlayerId,
        id: InstanceId,
    ) -> Result<(), InstanceError> {
        let info = world
            .resolve(player)
            .ok_or(InstanceError::InvalidPlayer(player))?;

        let instance = self.instances.get(&id).ok_or(InstanceError::NotFound(id))?;

        if info.level < instance.min_level {
            tracing::debug!(
                instance_id = %id,
                player_id = %player,
                level = info.level,
                required = instance.min_level,
                "bind rejected: level too low"
            );
            return Err(InstanceError::LevelTooLow {
                player,
                level: info.level,
                required: instance.min_level,
            });
        }

        // Either side of the membership may name the other instance. A
        // back-reference to an instance that has since closed is stale and
        // does not count.
        let current = self
            .members
            .get(&player)
            .copied()
            .or(info.instance)
            .filter(|current| *current != id && self.instances.contains_key(current));
        if let Some(current) = current {
            tracing::debug!(
                instance_id = %id,
                player_id = %player,
                current = %current,
                "bind rejected: already bound elsewhere"
            );
            return Err(InstanceError::AlreadyBound { player, current });
        }

        if let Some(instance) = self.instances.get_mut(&id) {
            instance.players.insert(player);
        }
        self.members.insert(player, id);
        world.set_instance(player, Some(id));

        tracing::debug!(instance_id = %id, player_id = %player, "player bound");
        Ok(())
    }

    /// Binds `leader` and every member of the leader's party to `id`, or
    /// nobody.
    ///
    /// Without a party this is [`bind_player`](Self::bind_player). With
    /// one, the leader is bound first and then each member in party
    /// order. The first failure unbinds everyone bound so far, then the
    /// failing member's error is returned.
    pub fn bind_party<W: PlayerDirectory + ?Sized>(
        &mut self,
        world: &mut W,
        leader: PlayerId,
        id: InstanceId,
    ) -> Result<(), InstanceError> {
        let Some(members) = world.party_members(leader) else {
            return self.bind_player(world, leader, id);
        };

        let mut seen = HashSet::new();
        let mut bound = Vec::with_capacity(members.len() + 1);

        for member in std::iter::once(leader).chain(members) {
            if !seen.insert(member) {
                continue;
            }
            if let Err(e) = self.bind_player(world, member, id) {
                tracing::warn!(
                    instance_id = %id,
                    leader = %leader,
                    failed = %member,
                    unwound = bound.len(),
                    reason = %e,
                    "party bind failed, unbinding party"
                );
                for player in bound {
                    self.player_leave(world, player);
                }
                return Err(e);
            }
            bound.push(member);
        }

        tracing::info!(
            instance_id = %id,
            leader = %leader,
            players = bound.len(),
            "party bound"
        );
        Ok(())
    }
}
