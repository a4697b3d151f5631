//! The default `MapLoader::template_exists` probes the real filesystem.

use std::path::Path;

use delveforge_world::{MapLoader, WorldError};

struct FileLoader;

impl MapLoader for FileLoader {
    fn merge_map_file(&mut self, _path: &Path) -> Result<(), WorldError> {
        Ok(())
    }
}

#[test]
fn test_default_probe_finds_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crypt.otbm");
    std::fs::write(&path, b"OTBM").unwrap();

    assert!(FileLoader.template_exists(&path));
}

#[test]
fn test_default_probe_misses_absent_file() {
    let dir = tempfile::tempdir().unwrap();

    assert!(!FileLoader.template_exists(&dir.path().join("missing.otbm")));
}

#[test]
fn test_default_probe_ignores_directories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("crypt.otbm")).unwrap();

    assert!(!FileLoader.template_exists(&dir.path().join("crypt.otbm")));
}
