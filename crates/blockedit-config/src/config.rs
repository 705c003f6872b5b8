//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World shape and generation.
    pub world: WorldConfig,
    /// Viewer synchronization settings.
    pub sync: SyncConfig,
    /// Edit session settings.
    pub edit: EditConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Lowest block Y.
    pub min_y: i32,
    /// Height in blocks. Must be a positive multiple of 16.
    pub height: u32,
    /// Y of the first air block above flat terrain.
    pub ground_level: i32,
}

/// Viewer synchronization configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// View distance in chunks given to new viewers.
    pub view_distance: u32,
}

/// Edit session configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditConfig {
    /// Recompute light for edited positions on commit.
    pub update_lighting: bool,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_y: -64,
            height: 384,
            ground_level: 64,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { view_distance: 10 }
    }
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            update_lighting: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for this tool, e.g. `~/.config/blockedit`.
///
/// Falls back to the working directory when the platform has none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("blockedit"))
        .unwrap_or_else(|| PathBuf::from("."))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Checks values serde cannot: world height granularity and a ground
    /// level inside the world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if world.height == 0 || world.height % 16 != 0 {
            return Err(ConfigError::Invalid(format!(
                "world.height must be a positive multiple of 16, got {}",
                world.height
            )));
        }
        let top = i64::from(world.min_y) + i64::from(world.height);
        if i32::try_from(world.height).is_err() || top > i64::from(i32::MAX) {
            return Err(ConfigError::Invalid(format!(
                "world.height {} with min_y {} does not fit in i32 (top {top})",
                world.height, world.min_y
            )));
        }
        let ground = i64::from(world.ground_level);
        if ground < i64::from(world.min_y) || ground > top {
            return Err(ConfigError::Invalid(format!(
                "world.ground_level {} outside {}..={top}",
                world.ground_level, world.min_y
            )));
        }
        Ok(())
    }
}
