//! Runtime configuration, loaded from TOML.
//!
//! Every section has defaults, so an empty or partial file is valid. A
//! missing or malformed file falls back to the defaults with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::LibraryError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    pub stage: StageConfig,
    pub executor: ExecutorConfig,
    pub sprite: SpriteConfig,
    pub bubble: BubbleConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    pub width: u32,
    pub height: u32,
    /// `#rrggbb` background used by new and cleared stages.
    pub background: String,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            background: "#ffffff".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum nesting of event firings before a chain is cut off.
    pub max_fire_depth: usize,
    /// Frame interval the host drives `tick` at, in milliseconds.
    pub tick_ms: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_fire_depth: 64,
            tick_ms: 1000.0 / 60.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SpriteConfig {
    /// Costume images are scaled down so neither side exceeds this.
    pub max_costume_size: f64,
    /// Side length of a sprite with no costume.
    pub fallback_size: f64,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            max_costume_size: 200.0,
            fallback_size: 50.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BubbleConfig {
    pub max_width: f64,
    pub padding: f64,
    pub font_size: f64,
    pub line_gap: f64,
    /// Gap between the top of the sprite and the bottom of the bubble.
    pub offset: f64,
    /// Average glyph advance used by the built-in text measure.
    pub char_width: f64,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        Self {
            max_width: 150.0,
            padding: 10.0,
            font_size: 14.0,
            line_gap: 4.0,
            offset: 15.0,
            char_width: 7.0,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, LibraryError> {
        let config: RuntimeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Loads `path`, or the per-user config file when `path` is `None`.
    /// Any failure is logged and yields the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) => p,
            None => return Self::default(),
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded runtime config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load config {}, using defaults: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), LibraryError> {
        if self.stage.width == 0 || self.stage.height == 0 {
            return Err(LibraryError::Config("stage size must be non-zero".into()));
        }
        if self.executor.max_fire_depth == 0 {
            return Err(LibraryError::Config("max_fire_depth must be at least 1".into()));
        }
        if self.sprite.max_costume_size <= 0.0 {
            return Err(LibraryError::Config("max_costume_size must be positive".into()));
        }
        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "fart", "fart_runtime").map(|dirs| dirs.config_dir().join("runtime.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [stage]
            width = 800

            [executor]
            max_fire_depth = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.stage.width, 800);
        assert_eq!(config.stage.height, 360);
        assert_eq!(config.executor.max_fire_depth, 8);
        assert_eq!(config.sprite.max_costume_size, 200.0);
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = RuntimeConfig::from_toml_str("[executor]\nmax_fire_depth = 0\n").unwrap_err();
        assert!(matches!(err, LibraryError::Config(_)));
    }
}
