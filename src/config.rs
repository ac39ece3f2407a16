// Startup settings. Read from a JSON file next to where you run it (same
// idea as a project file); anything missing takes its default.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::shared::DEFAULT_VOLUME;

pub const CONFIG_FILE: &str = "dubboard.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub volume: f32,
    pub tick_ms: u64, // front-end poll interval
    pub command_capacity: usize, // voices queued for the audio thread
    pub seed: Option<u64>, // fixed composer seed, random if absent
    pub style: String,
    pub outline_dir: Option<PathBuf>, // where <style>.json outlines live
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            tick_ms: 16, // ~60fps
            command_capacity: 1024,
            seed: None,
            style: "dubstep".to_string(),
            outline_dir: None,
        }
    }
}

impl Config {
    // A missing file is fine (defaults); a broken one is an error.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let mut config: Config =
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        config.sanitize();
        Ok(config)
    }

    pub fn default_path() -> PathBuf {
        std::env::current_dir().unwrap_or_default().join(CONFIG_FILE)
    }

    fn sanitize(&mut self) {
        self.volume = if self.volume.is_nan() { DEFAULT_VOLUME } else { self.volume.clamp(0.0, 1.0) };
        self.tick_ms = self.tick_ms.clamp(1, 1000);
        self.command_capacity = self.command_capacity.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = Config::load(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.volume, 0.7);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{ "volume": 2.0, "seed": 42, "style": "house" }"#).unwrap();
        let c = Config::load(&path).unwrap();
        assert_eq!(c.volume, 1.0); // clamped
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.style, "house");
        assert_eq!(c.tick_ms, 16);
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ volume: ").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
