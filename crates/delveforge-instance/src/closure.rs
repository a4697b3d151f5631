//! Closure handler: evicting members and freeing registry slots.

use delveforge_types::{InstanceId, PlayerId};
use delveforge_world::{PlayerDirectory, World};

use crate::{InstanceError, InstanceManager};

/// What happened to the members of a closed instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReport {
    pub id: InstanceId,
    pub name: String,
    pub reason: String,
    /// Connected members moved to the instance exit.
    pub to_exit: Vec<PlayerId>,
    /// Connected members sent to their home temple instead.
    pub to_home: Vec<PlayerId>,
    /// Members that were offline; only their membership was dropped.
    pub offline: Vec<PlayerId>,
}

impl CloseReport {
    /// Every connected member that was evicted and notified.
    pub fn evicted(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.to_exit.iter().chain(self.to_home.iter()).copied()
    }
}

impl InstanceManager {
    /// Closes instance `id`, evicting every member.
    ///
    /// Each connected member is moved to the instance exit, or to their
    /// home temple if the exit is unset or the move fails, is sent a
    /// notice naming the instance and `reason`, and has their
    /// back-reference cleared. The registry entry is removed only after
    /// all members have been processed.
    ///
    /// # Errors
    /// Returns [`InstanceError::NotFound`] if `id` is not open.
    pub fn close<W: World + ?Sized>(
        &mut self,
        world: &mut W,
        id: InstanceId,
        reason: &str,
    ) -> Result<CloseReport, InstanceError> {
        let instance = self.instances.get(&id).ok_or(InstanceError::NotFound(id))?;

        let members: Vec<PlayerId> = instance.players.iter().copied().collect();
        let exit = instance.exit;
        let mut report = CloseReport {
            id,
            name: instance.name.clone(),
            reason: reason.to_string(),
            to_exit: Vec::new(),
            to_home: Vec::new(),
            offline: Vec::new(),
        };
        let notice = format!(
            "The instance '{}' has been closed: {}.",
            report.name, reason
        );

        tracing::info!(
            instance_id = %id,
            name = %report.name,
            %reason,
            members = members.len(),
            "closing instance"
        );

        for player in members {
            self.members.remove(&player);

            let Some(info) = world.resolve(player) else {
                // Offline: nobody to move or notify, but the stored
                // character must not keep pointing at this instance.
                world.set_instance(player, None);
                report.offline.push(player);
                continue;
            };

            let at_exit = exit.is_valid() && {
                let outcome = world.relocate(player, exit, true);
                if !outcome.is_success() {
                    tracing::warn!(
                        instance_id = %id,
                        player_id = %player,
                        %exit,
                        reason = %outcome,
                        "exit relocation failed, sending home"
                    );
                }
                outcome.is_success()
            };

            if at_exit {
                report.to_exit.push(player);
            } else {
                let outcome = world.relocate(player, info.home, false);
                if !outcome.is_success() {
                    tracing::warn!(
                        instance_id = %id,
                        player_id = %player,
                        home = %info.home,
                        reason = %outcome,
                        "home relocation failed"
                    );
                }
                report.to_home.push(player);
            }

            world.send_notice(player, &notice);
            world.set_instance(player, None);
        }

        self.instances.remove(&id);
        tracing::info!(
            instance_id = %id,
            to_exit = report.to_exit.len(),
            to_home = report.to_home.len(),
            offline = report.offline.len(),
            "instance closed"
        );
        Ok(report)
    }

    /// Removes `player` from whichever instance they belong to.
    ///
    /// Clears the player's back-reference. Returns `false` if the player
    /// was not a member of any open instance. The player is not moved.
    pub fn player_leave<W: PlayerDirectory + ?Sized>(
        &mut self,
        world: &mut W,
        player: PlayerId,
    ) -> bool {
        let Some(id) = self.members.remove(&player) else {
            return false;
        };
        if let Some(instance) = self.instances.get_mut(&id) {
            instance.players.remove(&player);
        }
        world.set_instance(player, None);
        tracing::debug!(instance_id = %id, player_id = %player, "player left instance");
        true
    }

    /// Hook for a tracked boss dying.
    ///
    /// Nothing maps a dying monster back to its owning instance yet, so
    /// this never closes anything and always returns `None`.
    pub fn on_boss_death(&self, boss: &str) -> Option<InstanceId> {
        let tracked = self.instances.values().any(|i| i.bosses.contains(boss));
        tracing::debug!(boss, tracked, "boss death observed, no owning-instance resolution");
        None
    }
}
