//! Instance manager: the registry of open instances.
//!
//! The lifecycle operations live in sibling modules (`binding`,
//! `teleport`, `closure`, `expiry`) as further `impl InstanceManager`
//! blocks; this module holds the state they share.

use std::collections::{BTreeMap, HashMap};

use delveforge_types::{InstanceId, PlayerId};
use delveforge_world::{Clock, MapLoader, SystemClock};

use crate::{
    ActiveInstance, InstanceConfig, InstanceError, InstanceSummary, ManagerConfig,
    MapTemplateCache,
};

/// Owns every open instance and the player → instance index.
///
/// Constructed explicitly and handed to whatever runs the game task; there
/// is no global accessor. All methods are synchronous and take the world
/// collaborators by `&mut` for the duration of the call only.
///
/// ## Invariants
///
/// - An identifier present in `instances` denotes an open instance.
///   Identifiers start at 1 and count up. After the counter wraps, an
///   identifier still held by an open instance is never handed out again.
/// - `members[p] == id` exactly when `instances[id].players` contains `p`.
///   A player is a member of at most one instance.
pub struct InstanceManager {
    /// Open instances, ordered by identifier.
    pub(crate) instances: BTreeMap<InstanceId, ActiveInstance>,

    /// Maps each bound player to their instance.
    pub(crate) members: HashMap<PlayerId, InstanceId>,

    pub(crate) maps: MapTemplateCache,

    pub(crate) clock: Box<dyn Clock>,

    next_id: InstanceId,
}

impl InstanceManager {
    /// Creates an empty manager reading time from the system clock.
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: ManagerConfig, clock: impl Clock) -> Self {
        Self {
            instances: BTreeMap::new(),
            members: HashMap::new(),
            maps: MapTemplateCache::new(&config),
            clock: Box::new(clock),
            next_id: InstanceId::FIRST,
        }
    }

    /// Creates an instance from `config` and returns its identifier.
    ///
    /// The map template is made ready first; if that fails nothing is
    /// allocated and the identifier counter does not move.
    ///
    /// # Errors
    /// Returns [`InstanceError::MapLoad`] if the template merge fails.
    pub fn create<L: MapLoader + ?Sized>(
        &mut self,
        loader: &mut L,
        config: InstanceConfig,
    ) -> Result<InstanceId, InstanceError> {
        let status = self.maps.ensure_loaded(loader, &config.map_template)?;

        let id = self.allocate_id();

        let instance = ActiveInstance::from_config(id, config, self.clock.now());
        tracing::info!(
            instance_id = %id,
            name = %instance.name,
            template = %instance.map_template,
            ?status,
            duration_secs = instance
                .ends_at
                .and_then(|end| end.duration_since(instance.started_at).ok())
                .map(|d| d.as_secs()),
            "instance created"
        );
        self.instances.insert(id, instance);
        Ok(id)
    }

    /// Takes the next identifier not held by an open instance.
    ///
    /// The counter only comes back to a low identifier after wrapping, and
    /// then steps over any that are still open.
    fn allocate_id(&mut self) -> InstanceId {
        let mut id = self.next_id;
        while self.instances.contains_key(&id) {
            id = id.next();
        }
        self.next_id = id.next();
        id
    }

    /// Looks up an open instance.
    pub fn get(&self, id: InstanceId) -> Option<&ActiveInstance> {
        self.instances.get(&id)
    }

    /// All open instances in identifier order.
    pub fn list(&self) -> impl Iterator<Item = &ActiveInstance> + '_ {
        self.instances.values()
    }

    /// Owned snapshots of all open instances, in identifier order.
    pub fn summaries(&self) -> Vec<InstanceSummary> {
        self.instances.values().map(ActiveInstance::summary).collect()
    }

    /// `true` if instance `id` is open and `player` is one of its members.
    pub fn is_player_bound(&self, player: PlayerId, id: InstanceId) -> bool {
        self.instances
            .get(&id)
            .is_some_and(|instance| instance.has_player(player))
    }

    /// The open instance `player` is bound to, if any.
    pub fn instance_of(&self, player: PlayerId) -> Option<InstanceId> {
        self.members.get(&player).copied()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The identifier the next successful `create` will return.
    pub fn next_id(&self) -> InstanceId {
        self.next_id
    }

    pub fn map_cache(&self) -> &MapTemplateCache {
        &self.maps
    }
}

impl Default for InstanceManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl std::fmt::Debug for InstanceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceManager")
            .field("instances", &self.instances.len())
            .field("members", &self.members.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delveforge_world::ManualClock;
    use delveforge_world::memory::MemoryWorld;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn manager() -> (InstanceManager, ManualClock) {
        let clock = ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(10_000));
        let config = ManagerConfig {
            maps_dir: PathBuf::from("maps"),
            ..ManagerConfig::default()
        };
        (InstanceManager::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_create_returns_increasing_ids_from_one() {
        let (mut mgr, _) = manager();
        let mut world = MemoryWorld::new();

        let a = mgr.create(&mut world, InstanceConfig::default()).unwrap();
        let b = mgr.create(&mut world, InstanceConfig::default()).unwrap();

        assert_eq!(a, InstanceId(1));
        assert_eq!(b, InstanceId(2));
        assert_eq!(mgr.len(), 2);
        assert_eq!(mgr.next_id(), InstanceId(3));
    }

    #[test]
    fn test_create_timestamps_from_clock() {
        let (mut mgr, clock) = manager();
        let mut world = MemoryWorld::new();
        let config = InstanceConfig {
            duration_secs: 600,
            ..Default::default()
        };

        let id = mgr.create(&mut world, config).unwrap();

        let instance = mgr.get(id).unwrap();
        assert_eq!(instance.started_at(), clock.now());
        assert_eq!(instance.ends_at(), Some(clock.now() + Duration::from_secs(600)));
    }

    #[test]
    fn test_failed_create_allocates_nothing() {
        let (mut mgr, _) = manager();
        let mut world = MemoryWorld::new();
        world.add_broken_template("maps/crypt.otbm");
        let config = InstanceConfig {
            map_template: "crypt".into(),
            ..Default::default()
        };

        let result = mgr.create(&mut world, config);

        assert!(matches!(result, Err(InstanceError::MapLoad { .. })));
        assert!(mgr.is_empty());
        assert_eq!(mgr.next_id(), InstanceId(1));
    }

    #[test]
    fn test_ids_not_reused_after_close() {
        let (mut mgr, _) = manager();
        let mut world = MemoryWorld::new();
        let first = mgr.create(&mut world, InstanceConfig::default()).unwrap();
        mgr.close(&mut world, first, "done").unwrap();

        let second = mgr.create(&mut world, InstanceConfig::default()).unwrap();

        assert_ne!(first, second);
        assert_eq!(second, InstanceId(2));
    }

    #[test]
    fn test_wrapped_counter_skips_open_instances() {
        let (mut mgr, _) = manager();
        let mut world = MemoryWorld::new();
        let first = mgr.create(&mut world, InstanceConfig::default()).unwrap();
        mgr.next_id = InstanceId(u32::MAX);

        let last = mgr.create(&mut world, InstanceConfig::default()).unwrap();
        let wrapped = mgr.create(&mut world, InstanceConfig::default()).unwrap();

        assert_eq!(first, InstanceId(1));
        assert_eq!(last, InstanceId(u32::MAX));
        assert_eq!(wrapped, InstanceId(2));
        assert_eq!(mgr.len(), 3);
        assert_eq!(mgr.next_id(), InstanceId(3));
    }

    #[test]
    fn test_list_in_identifier_order() {
        let (mut mgr, _) = manager();
        let mut world = MemoryWorld::new();
        for name in ["a", "b", "c"] {
            let config = InstanceConfig {
                name: name.into(),
                ..Default::default()
            };
            mgr.create(&mut world, config).unwrap();
        }

        let names: Vec<&str> = mgr.list().map(|i| i.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(mgr.summaries().len(), 3);
    }

    #[test]
    fn test_is_player_bound_unknown_instance() {
        let (mgr, _) = manager();
        assert!(!mgr.is_player_bound(PlayerId(1), InstanceId(1)));
        assert_eq!(mgr.instance_of(PlayerId(1)), None);
    }
}
