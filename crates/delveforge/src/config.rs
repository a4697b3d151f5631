//! Service configuration, loaded from TOML.

use std::path::{Path, PathBuf};
use std::time::Duration;

use delveforge_instance::{InstanceConfig, ManagerConfig};
use delveforge_tick::{MissedTickPolicy, TaskConfig};
use serde::{Deserialize, Serialize};

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings for an [`InstanceService`](crate::InstanceService).
///
/// ```toml
/// sweep_interval_ms = 5000
/// sweep_policy = "skip"
/// sweep_jitter_ms = 0
/// command_queue = 256
/// log_filter = "info,delveforge_instance=debug"
///
/// [manager]
/// maps_dir = "data/world/instances"
/// map_extension = "otbm"
///
/// [[instance]]
/// name = "Crypt"
/// map_template = "crypt"
/// min_level = 20
/// entry = { x = 100, y = 100, z = 7 }
/// exit = { x = 50, y = 50, z = 7 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How often the expiry sweep runs. `0` disables it.
    pub sweep_interval_ms: u64,

    /// `skip` reschedules a late sweep from now, `fixed` keeps the
    /// original cadence.
    pub sweep_policy: MissedTickPolicy,

    /// Upper bound of a random delay added to the first sweep only.
    pub sweep_jitter_ms: u64,

    /// Capacity of the game task's command queue. Callers wait when it
    /// is full.
    pub command_queue: usize,

    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub log_filter: String,

    pub manager: ManagerConfig,

    /// Named instance blueprints, one `[[instance]]` table each.
    #[serde(rename = "instance")]
    pub blueprints: Vec<InstanceConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 5000,
            sweep_policy: MissedTickPolicy::Skip,
            sweep_jitter_ms: 0,
            command_queue: 256,
            log_filter: "info".to_string(),
            manager: ManagerConfig::default(),
            blueprints: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Reads and parses a TOML config file. Missing keys take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            blueprints = config.blueprints.len(),
            "loaded service config"
        );
        Ok(config)
    }

    /// Renders this config as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The blueprint called `name`, if one is configured.
    pub fn blueprint(&self, name: &str) -> Option<&InstanceConfig> {
        self.blueprints.iter().find(|b| b.name == name)
    }

    /// Settings for the expiry sweep task.
    pub fn sweep_task(&self) -> TaskConfig {
        TaskConfig {
            policy: self.sweep_policy,
            initial_jitter: Duration::from_millis(self.sweep_jitter_ms),
            ..TaskConfig::every_ms(self.sweep_interval_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use delveforge_types::Position;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.sweep_interval_ms, 5000);
        assert_eq!(config.command_queue, 256);
        assert_eq!(config.log_filter, "info");
        assert!(config.blueprints.is_empty());
        assert_eq!(
            config.sweep_task().interval,
            Some(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            sweep_interval_ms = 1000

            [manager]
            maps_dir = "maps"
            "#,
        )
        .unwrap();

        assert_eq!(config.sweep_interval_ms, 1000);
        assert_eq!(config.command_queue, 256);
        assert_eq!(config.manager.maps_dir, PathBuf::from("maps"));
        assert_eq!(config.manager.map_extension, "otbm");
    }

    #[test]
    fn test_blueprints_by_name() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [[instance]]
            name = "Crypt"
            min_level = 20
            entry = { x = 100, y = 100, z = 7 }

            [[instance]]
            name = "Sewers"
            duration_secs = 600
            "#,
        )
        .unwrap();

        let crypt = config.blueprint("Crypt").unwrap();
        assert_eq!(crypt.min_level, 20);
        assert_eq!(crypt.entry, Position::new(100, 100, 7));
        assert_eq!(config.blueprint("Sewers").unwrap().duration_secs, 600);
        assert!(config.blueprint("Tower").is_none());
    }

    #[test]
    fn test_sweep_policy_and_jitter_reach_the_task() {
        let config: ServiceConfig = toml::from_str(
            r#"
            sweep_interval_ms = 2000
            sweep_policy = "fixed"
            sweep_jitter_ms = 250
            "#,
        )
        .unwrap();

        let task = config.sweep_task();
        assert_eq!(task.interval, Some(Duration::from_secs(2)));
        assert_eq!(task.policy, MissedTickPolicy::Fixed);
        assert_eq!(task.initial_jitter, Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_sweep_policy_is_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str(r#"sweep_policy = "burst""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_sweep_interval_disables_sweep() {
        let config = ServiceConfig {
            sweep_interval_ms: 0,
            ..Default::default()
        };
        assert!(config.sweep_task().interval.is_none());
    }

    #[test]
    fn test_defaults_survive_toml() {
        let text = ServiceConfig::default().to_toml().unwrap();
        let parsed: ServiceConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, ServiceConfig::default());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "sweep_interval_ms = \"soon\"").unwrap();

        let err = ServiceConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
        assert!(err.to_string().contains("broken.toml"));

        let err = ServiceConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delveforge.toml");
        std::fs::write(
            &path,
            "command_queue = 8\n\n[[instance]]\nname = \"Crypt\"\n",
        )
        .unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.command_queue, 8);
        assert!(config.blueprint("Crypt").is_some());
    }
}
