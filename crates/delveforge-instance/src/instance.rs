//! The runtime record of one live instance.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime};

use delveforge_types::{InstanceId, PlayerId, Position};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::{InstanceConfig, Scaling};

/// One live instance.
///
/// Owned by the [`InstanceManager`](crate::InstanceManager). Fields are
/// read-only from outside the crate: the blueprint values never change
/// after creation, and membership only changes through the manager's
/// bind/leave/close operations.
#[derive(Debug, Clone)]
pub struct ActiveInstance {
    pub(crate) id: InstanceId,
    pub(crate) name: String,
    pub(crate) map_template: String,
    pub(crate) started_at: SystemTime,
    pub(crate) ends_at: Option<SystemTime>,
    pub(crate) warn_at: Vec<u64>,
    pub(crate) scaling: Scaling,
    pub(crate) entry: Position,
    pub(crate) exit: Position,
    pub(crate) bosses: BTreeSet<String>,
    pub(crate) party_only: bool,
    pub(crate) min_level: u32,
    pub(crate) cooldown: Duration,
    pub(crate) seed: u64,
    pub(crate) players: BTreeSet<PlayerId>,
    /// Reserved for spawned creatures; nothing populates it yet.
    pub(crate) creatures: BTreeSet<u32>,
}

impl ActiveInstance {
    pub(crate) fn from_config(id: InstanceId, config: InstanceConfig, now: SystemTime) -> Self {
        // An end time the clock cannot represent is treated as no end.
        let ends_at = match config.duration_secs {
            0 => None,
            secs => {
                let end = now.checked_add(Duration::from_secs(secs));
                if end.is_none() {
                    tracing::warn!(
                        instance_id = %id,
                        duration_secs = secs,
                        "instance duration out of range, instance will not expire"
                    );
                }
                end
            }
        };

        let mut warn_at = config.warn_at;
        warn_at.sort_unstable_by(|a, b| b.cmp(a));
        warn_at.dedup();

        Self {
            id,
            name: config.name,
            map_template: config.map_template,
            started_at: now,
            ends_at,
            warn_at,
            scaling: config.scaling.validated(),
            entry: config.entry,
            exit: config.exit,
            bosses: config.bosses,
            party_only: config.party_only,
            min_level: config.min_level,
            cooldown: Duration::from_secs(config.cooldown_secs),
            seed: config.seed,
            players: BTreeSet::new(),
            creatures: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn map_template(&self) -> &str {
        &self.map_template
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// `None` for instances that never expire.
    pub fn ends_at(&self) -> Option<SystemTime> {
        self.ends_at
    }

    /// Warning offsets in seconds before expiry, largest first.
    pub fn warn_at(&self) -> &[u64] {
        &self.warn_at
    }

    pub fn scaling(&self) -> &Scaling {
        &self.scaling
    }

    pub fn entry(&self) -> Position {
        self.entry
    }

    pub fn exit(&self) -> Position {
        self.exit
    }

    pub fn bosses(&self) -> &BTreeSet<String> {
        &self.bosses
    }

    pub fn party_only(&self) -> bool {
        self.party_only
    }

    pub fn min_level(&self) -> u32 {
        self.min_level
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn players(&self) -> &BTreeSet<PlayerId> {
        &self.players
    }

    pub fn creatures(&self) -> &BTreeSet<u32> {
        &self.creatures
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    /// `true` once `now` has reached the end timestamp.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.ends_at.is_some_and(|end| now >= end)
    }

    /// Time left before expiry. `None` for instances that never expire.
    pub fn remaining(&self, now: SystemTime) -> Option<Duration> {
        self.ends_at
            .map(|end| end.duration_since(now).unwrap_or(Duration::ZERO))
    }

    /// A generator seeded from the blueprint seed.
    ///
    /// Every call starts the same sequence, so content generated from it
    /// is identical for identical blueprints.
    pub fn content_rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    pub fn summary(&self) -> InstanceSummary {
        InstanceSummary {
            id: self.id,
            name: self.name.clone(),
            map_template: self.map_template.clone(),
            started_at: self.started_at,
            ends_at: self.ends_at,
            min_level: self.min_level,
            party_only: self.party_only,
            players: self.players.iter().copied().collect(),
        }
    }
}

/// An owned snapshot of an instance, for callers outside the game task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSummary {
    pub id: InstanceId,
    pub name: String,
    pub map_template: String,
    pub started_at: SystemTime,
    pub ends_at: Option<SystemTime>,
    pub min_level: u32,
    pub party_only: bool,
    pub players: Vec<PlayerId>,
}
