use anyhow::{Context, Result};
use directories::ProjectDirs;
use goggles_vision::{model::DEFAULT_DETECTOR_MODEL, AngleMode};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(path) = option_env!("GOGGLES_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "goggles")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("goggles.toml"))
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model_path: PathBuf,
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub angle_mode: AngleMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_DETECTOR_MODEL),
            score_threshold: 0.6,
            nms_threshold: 0.3,
            angle_mode: AngleMode::Slope,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data).with_context(|| format!("writing config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("goggles-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = load_config(Some(&scratch("absent.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.angle_mode, AngleMode::Slope);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let path = scratch("partial.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "angle_mode = \"atan2\"\nscore_threshold = 0.8\n").unwrap();

        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.angle_mode, AngleMode::Atan2);
        assert!((cfg.score_threshold - 0.8).abs() < 1e-6);
        assert!((cfg.nms_threshold - 0.3).abs() < 1e-6);
    }

    #[test]
    fn save_then_load() {
        let path = scratch("nested/saved.toml");
        let cfg = Config {
            model_path: PathBuf::from("/opt/models/yunet.onnx"),
            angle_mode: AngleMode::Atan2,
            ..Config::default()
        };
        save_config(&cfg, Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), cfg);
    }

    #[test]
    fn bad_angle_mode_is_rejected() {
        let path = scratch("bad.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "angle_mode = \"degrees\"\n").unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
