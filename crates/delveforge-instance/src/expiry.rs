//! Expiry sweep.
//!
//! The sweep itself is a plain method; the cadence it runs at belongs to
//! whoever drives the game task (see `delveforge::InstanceService`).

use std::time::SystemTime;

use delveforge_types::InstanceId;
use delveforge_world::World;

use crate::{CloseReport, InstanceManager};

/// The close reason used for time-expired instances.
pub const EXPIRED_REASON: &str = "expired";

impl InstanceManager {
    /// Instances whose end time is set and has been reached at `now`.
    pub fn expired_at(&self, now: SystemTime) -> Vec<InstanceId> {
        self.instances
            .values()
            .filter(|instance| instance.is_expired(now))
            .map(|instance| instance.id)
            .collect()
    }

    /// Closes every expired instance with reason [`EXPIRED_REASON`].
    ///
    /// The clock is read once and the expired set is snapshotted before
    /// any instance is closed.
    pub fn sweep_expired<W: World + ?Sized>(&mut self, world: &mut W) -> Vec<CloseReport> {
        let now = self.clock.now();
        let expired = self.expired_at(now);
        if expired.is_empty() {
            tracing::trace!(open = self.instances.len(), "expiry sweep: nothing expired");
            return Vec::new();
        }

        tracing::info!(count = expired.len(), "expiry sweep closing instances");
        expired
            .into_iter()
            .filter_map(|id| self.close(world, id, EXPIRED_REASON).ok())
            .collect()
    }
}
