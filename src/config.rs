use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::{IsoLimits, IsoParams};

/// Persisted session parameters: the test-area dimensions the ring is
/// centred in, the initial ISO task parameters, and the difficulty
/// classes of the experiment cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub area_width: f64,
    pub area_height: f64,
    pub target_count: usize,
    pub ring_distance: f64,
    pub target_width: f64,
    pub cursor_diameter: f64,
    pub randomize: bool,
    pub id_classes: Vec<f64>,
    pub limits: IsoLimits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            area_width: 900.0,
            area_height: 650.0,
            target_count: 9,
            ring_distance: 500.0,
            target_width: 50.0,
            cursor_diameter: 0.0,
            randomize: true,
            id_classes: crate::experiment::ID_CLASSES.to_vec(),
            limits: IsoLimits::default(),
        }
    }
}

impl Config {
    pub fn center(&self) -> (f64, f64) {
        (self.area_width / 2.0, self.area_height / 2.0)
    }

    pub fn params(&self) -> IsoParams {
        IsoParams {
            count: self.target_count,
            distance: self.ring_distance,
            width: self.target_width,
            cursor_diameter: self.cursor_diameter,
            randomize: self.randomize,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "isofitts") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("isofitts_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            target_count: 15,
            ring_distance: 150.0,
            target_width: 10.0,
            randomize: false,
            id_classes: vec![2.0, 3.0, 4.0],
            ..Config::default()
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn default_center_is_area_middle() {
        let cfg = Config::default();
        assert_eq!(cfg.center(), (450.0, 325.0));
    }
}
