//! Map template cache.
//!
//! Before anyone can be teleported into an instance, its map template has
//! to be part of the shared world. The cache remembers which templates
//! have been dealt with so each one is merged at most once per process.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use delveforge_world::MapLoader;

use crate::{InstanceError, ManagerConfig};

/// How [`MapTemplateCache::ensure_loaded`] satisfied a request.
///
/// Every variant is a success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateStatus {
    /// The instance has no dedicated map.
    NoTemplate,
    /// Resolved earlier in this process.
    AlreadyLoaded,
    /// No template file exists; the geometry is assumed to already be
    /// part of the base world.
    AssumedBaseWorld,
    /// The template file was merged into the world just now.
    Merged,
}

/// Names of map templates known to be safe to teleport into.
#[derive(Debug)]
pub struct MapTemplateCache {
    maps_dir: PathBuf,
    extension: String,
    resolved: HashSet<String>,
}

impl MapTemplateCache {
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            maps_dir: config.maps_dir.clone(),
            extension: config.map_extension.trim_start_matches('.').to_string(),
            resolved: HashSet::new(),
        }
    }

    /// Makes sure the template `name` is present in the world.
    ///
    /// A missing template file is not an error: the name is cached as
    /// resolved and reported as [`TemplateStatus::AssumedBaseWorld`]. A
    /// merge failure is an error and is not cached, so a later call
    /// retries.
    pub fn ensure_loaded<L: MapLoader + ?Sized>(
        &mut self,
        loader: &mut L,
        name: &str,
    ) -> Result<TemplateStatus, InstanceError> {
        if name.is_empty() {
            return Ok(TemplateStatus::NoTemplate);
        }

        let file_name = self.file_name(name);
        if self.resolved.contains(&file_name) {
            return Ok(TemplateStatus::AlreadyLoaded);
        }

        let path = self.maps_dir.join(&file_name);
        if !loader.template_exists(&path) {
            tracing::debug!(
                template = name,
                path = %path.display(),
                "no template file, assuming base world"
            );
            self.resolved.insert(file_name);
            return Ok(TemplateStatus::AssumedBaseWorld);
        }

        loader
            .merge_map_file(&path)
            .map_err(|source| InstanceError::MapLoad {
                template: name.to_string(),
                source,
            })?;

        tracing::info!(template = name, path = %path.display(), "map template merged");
        self.resolved.insert(file_name);
        Ok(TemplateStatus::Merged)
    }

    /// `true` if `name` has already been resolved.
    pub fn is_resolved(&self, name: &str) -> bool {
        name.is_empty() || self.resolved.contains(&self.file_name(name))
    }

    /// The path a template would be probed at.
    pub fn template_path(&self, name: &str) -> PathBuf {
        self.maps_dir.join(self.file_name(name))
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    fn file_name(&self, name: &str) -> String {
        let has_extension = Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension.as_str()));
        if has_extension || self.extension.is_empty() {
            name.to_string()
        } else {
            format!("{name}.{}", self.extension)
        }
    }
}
