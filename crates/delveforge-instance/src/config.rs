//! Instance blueprints and manager settings.

use std::collections::BTreeSet;
use std::path::PathBuf;

use delveforge_types::Position;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Scaling
// ---------------------------------------------------------------------------

/// Multiplicative difficulty scalars applied inside an instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scaling {
    pub experience: f32,
    pub loot: f32,
    pub hit_points: f32,
    pub damage: f32,
    pub armor: f32,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            experience: 1.0,
            loot: 1.0,
            hit_points: 1.0,
            damage: 1.0,
            armor: 1.0,
        }
    }
}

impl Scaling {
    /// Fixes values that would make the scalars meaningless.
    ///
    /// NaN and infinities fall back to 1.0, negatives are raised to 0.0.
    pub fn validated(self) -> Self {
        fn fix(field: &'static str, value: f32) -> f32 {
            if !value.is_finite() {
                tracing::warn!(field, value, "non-finite scaling factor, using 1.0");
                1.0
            } else if value < 0.0 {
                tracing::warn!(field, value, "negative scaling factor, using 0.0");
                0.0
            } else {
                value
            }
        }

        Self {
            experience: fix("experience", self.experience),
            loot: fix("loot", self.loot),
            hit_points: fix("hit_points", self.hit_points),
            damage: fix("damage", self.damage),
            armor: fix("armor", self.armor),
        }
    }
}

// ---------------------------------------------------------------------------
// InstanceConfig
// ---------------------------------------------------------------------------

/// The immutable blueprint an instance is created from.
///
/// Deserializable so blueprints can live in the server's TOML config:
///
/// ```toml
/// name = "Crypt"
/// map_template = "crypt"
/// duration_secs = 1800
/// min_level = 20
/// entry = { x = 100, y = 100, z = 7 }
/// exit = { x = 50, y = 50, z = 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Display name, used in notices and logs.
    pub name: String,

    /// Map template backing the instance. Empty means the instance lives
    /// in the base world.
    pub map_template: String,

    /// Lifetime in seconds. 0 means the instance never expires.
    pub duration_secs: u64,

    /// Seconds before expiry at which a warning should go out.
    ///
    /// Stored and exposed; nothing emits these warnings yet.
    pub warn_at: Vec<u64>,

    pub scaling: Scaling,

    /// Where players arrive when teleported in.
    pub entry: Position,

    /// Where players go on eviction. Unset means their home temple.
    pub exit: Position,

    /// Names of tracked bosses.
    pub bosses: BTreeSet<String>,

    /// Stored and exposed; binding does not enforce it.
    pub party_only: bool,

    pub min_level: u32,

    /// Re-entry cooldown in seconds. Stored and exposed; not enforced.
    pub cooldown_secs: u64,

    /// Seed for reproducible content generation.
    pub seed: u64,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            map_template: String::new(),
            duration_secs: 1800,
            warn_at: Vec::new(),
            scaling: Scaling::default(),
            entry: Position::default(),
            exit: Position::default(),
            bosses: BTreeSet::new(),
            party_only: false,
            min_level: 1,
            cooldown_secs: 0,
            seed: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// ManagerConfig
// ---------------------------------------------------------------------------

/// Settings for an [`InstanceManager`](crate::InstanceManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Directory template files are probed in.
    pub maps_dir: PathBuf,

    /// Extension appended to template names that lack it.
    pub map_extension: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            maps_dir: PathBuf::from("data/world/instances"),
            map_extension: "otbm".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_config_defaults() {
        let config = InstanceConfig::default();
        assert_eq!(config.duration_secs, 1800);
        assert_eq!(config.min_level, 1);
        assert_eq!(config.scaling, Scaling::default());
        assert!(config.exit.is_unset());
        assert!(!config.party_only);
    }

    #[test]
    fn test_scaling_validated_fixes_bad_values() {
        let scaling = Scaling {
            experience: f32::NAN,
            loot: -2.0,
            hit_points: f32::INFINITY,
            damage: 1.5,
            armor: 0.0,
        }
        .validated();

        assert_eq!(scaling.experience, 1.0);
        assert_eq!(scaling.loot, 0.0);
        assert_eq!(scaling.hit_points, 1.0);
        assert_eq!(scaling.damage, 1.5);
        assert_eq!(scaling.armor, 0.0);
    }

    #[test]
    fn test_instance_config_from_toml_fills_defaults() {
        let config: InstanceConfig = toml::from_str(
            r#"
            name = "Crypt"
            map_template = "crypt"
            min_level = 20
            entry = { x = 100, y = 100, z = 7 }
            bosses = ["Lich King"]

            [scaling]
            damage = 1.25
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "Crypt");
        assert_eq!(config.duration_secs, 1800);
        assert_eq!(config.entry, Position::new(100, 100, 7));
        assert!(config.bosses.contains("Lich King"));
        assert_eq!(config.scaling.damage, 1.25);
        assert_eq!(config.scaling.loot, 1.0);
    }

    #[test]
    fn test_manager_config_default() {
        let config = ManagerConfig::default();
        assert_eq!(config.maps_dir, PathBuf::from("data/world/instances"));
        assert_eq!(config.map_extension, "otbm");
    }
}
