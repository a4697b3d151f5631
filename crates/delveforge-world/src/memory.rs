//! An in-memory world.
//!
//! `MemoryWorld` implements every collaborator trait with plain maps. It
//! records what the instance manager asked it to do (merged map files,
//! relocations, notices) so tests can assert on it, and it can be told to
//! fail specific relocations or merges to exercise the unwind paths.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use delveforge_types::{InstanceId, PlayerId, Position};

use crate::{MapLoader, PlayerDirectory, PlayerInfo, RelocateOutcome, Relocator, WorldError};

/// A player character held by [`MemoryWorld`].
#[derive(Debug, Clone)]
pub struct MemoryPlayer {
    pub level: u32,
    pub online: bool,
    pub position: Position,
    pub home: Position,
    pub instance: Option<InstanceId>,
    pub notices: Vec<String>,
}

impl MemoryPlayer {
    pub fn new(level: u32, home: Position) -> Self {
        Self {
            level,
            online: true,
            position: home,
            home,
            instance: None,
            notices: Vec::new(),
        }
    }
}

/// A world that lives entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryWorld {
    players: HashMap<PlayerId, MemoryPlayer>,
    /// Party leader → other members, in party order.
    parties: HashMap<PlayerId, Vec<PlayerId>>,
    /// Template files that exist without touching the filesystem.
    templates: HashSet<PathBuf>,
    /// Template files whose merge should fail.
    broken_templates: HashSet<PathBuf>,
    merged: Vec<PathBuf>,
    /// Positions relocation refuses to move anyone to.
    blocked: HashMap<Position, RelocateOutcome>,
    relocations: Vec<(PlayerId, Position)>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an online player standing at their home position.
    pub fn add_player(&mut self, id: PlayerId, level: u32, home: Position) {
        self.players.insert(id, MemoryPlayer::new(level, home));
    }

    /// Forms a party. Every member (leader included) sees the others.
    pub fn form_party(&mut self, leader: PlayerId, members: &[PlayerId]) {
        self.parties.insert(leader, members.to_vec());
        for member in members {
            let mut others = vec![leader];
            others.extend(members.iter().copied().filter(|m| m != member));
            self.parties.insert(*member, others);
        }
    }

    pub fn set_online(&mut self, id: PlayerId, online: bool) {
        if let Some(player) = self.players.get_mut(&id) {
            player.online = online;
        }
    }

    /// Registers a template file as present.
    pub fn add_template(&mut self, path: impl Into<PathBuf>) {
        self.templates.insert(path.into());
    }

    /// Registers a template file as present but unmergeable.
    pub fn add_broken_template(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.templates.insert(path.clone());
        self.broken_templates.insert(path);
    }

    /// Makes every relocation to `position` fail with `outcome`.
    pub fn block(&mut self, position: Position, outcome: RelocateOutcome) {
        self.blocked.insert(position, outcome);
    }

    pub fn unblock(&mut self, position: Position) {
        self.blocked.remove(&position);
    }

    pub fn player(&self, id: PlayerId) -> Option<&MemoryPlayer> {
        self.players.get(&id)
    }

    pub fn position_of(&self, id: PlayerId) -> Option<Position> {
        self.players.get(&id).map(|p| p.position)
    }

    pub fn instance_of(&self, id: PlayerId) -> Option<InstanceId> {
        self.players.get(&id).and_then(|p| p.instance)
    }

    pub fn notices(&self, id: PlayerId) -> &[String] {
        self.players
            .get(&id)
            .map(|p| p.notices.as_slice())
            .unwrap_or(&[])
    }

    /// Map files merged so far, in merge order.
    pub fn merged_maps(&self) -> &[PathBuf] {
        &self.merged
    }

    /// Every successful relocation, in order.
    pub fn relocations(&self) -> &[(PlayerId, Position)] {
        &self.relocations
    }
}

impl MapLoader for MemoryWorld {
    fn template_exists(&self, path: &Path) -> bool {
        self.templates.contains(path) || path.is_file()
    }

    fn merge_map_file(&mut self, path: &Path) -> Result<(), WorldError> {
        if self.broken_templates.contains(path) {
            return Err(WorldError::MapMerge {
                path: path.to_path_buf(),
                message: "corrupt map header".into(),
            });
        }
        tracing::debug!(path = %path.display(), "memory world merged map file");
        self.merged.push(path.to_path_buf());
        Ok(())
    }
}

impl Relocator for MemoryWorld {
    fn relocate(
        &mut self,
        player: PlayerId,
        target: Position,
        must_be_online: bool,
    ) -> RelocateOutcome {
        let Some(entry) = self.players.get_mut(&player) else {
            return RelocateOutcome::NotPossible;
        };
        if must_be_online && !entry.online {
            return RelocateOutcome::PlayerOffline;
        }
        if let Some(outcome) = self.blocked.get(&target) {
            return outcome.clone();
        }
        entry.position = target;
        self.relocations.push((player, target));
        RelocateOutcome::NoError
    }
}

impl PlayerDirectory for MemoryWorld {
    fn resolve(&self, player: PlayerId) -> Option<PlayerInfo> {
        let entry = self.players.get(&player).filter(|p| p.online)?;
        Some(PlayerInfo {
            id: player,
            level: entry.level,
            instance: entry.instance,
            home: entry.home,
        })
    }

    fn party_members(&self, player: PlayerId) -> Option<Vec<PlayerId>> {
        self.parties.get(&player).cloned()
    }

    fn set_instance(&mut self, player: PlayerId, instance: Option<InstanceId>) {
        if let Some(entry) = self.players.get_mut(&player) {
            entry.instance = instance;
        }
    }

    fn send_notice(&mut self, player: PlayerId, text: &str) {
        if let Some(entry) = self.players.get_mut(&player) {
            entry.notices.push(text.to_string());
        }
    }
}
