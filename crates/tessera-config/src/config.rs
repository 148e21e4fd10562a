//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_worldgen::{CaveConfig, CityConfig, DungeonConfig, ForestConfig, TerrainTunables};

use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Which tile to generate.
    pub tile: TileConfig,
    /// Heightmap and colormap tunables.
    pub terrain: TerrainTunables,
    /// City layout.
    pub city: CityConfig,
    /// Dungeon layout.
    pub dungeon: DungeonConfig,
    /// Cave fields.
    pub cave: CaveConfig,
    /// Foliage placement.
    pub forest: ForestConfig,
    /// Where output goes.
    pub output: OutputConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// The tile request shared by every generator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TileConfig {
    /// World seed.
    pub seed: i64,
    /// Tile width in cells.
    pub width: usize,
    /// Tile height in cells.
    pub height: usize,
    /// World X of cell `(0, 0)`. Cell-based generators round it to a cell.
    pub origin_x: f64,
    /// World Y of cell `(0, 0)`.
    pub origin_y: f64,
    /// World units between heightmap and city cells.
    pub units_per_cell: f64,
    /// Colormap texture width in pixels.
    pub texture_width: usize,
    /// Colormap texture height in pixels.
    pub texture_height: usize,
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives the PNG files.
    pub directory: PathBuf,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            width: 256,
            height: 256,
            origin_x: 0.0,
            origin_y: 0.0,
            units_per_cell: 1.0,
            texture_width: 512,
            texture_height: 512,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("out"),
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

impl TileConfig {
    /// World width covered by the heightmap under the shared-edge convention.
    pub fn world_width(&self) -> f64 {
        self.units_per_cell * self.width.saturating_sub(1) as f64
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// The platform config directory for tessera, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tessera"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(config_dir.join(CONFIG_FILE), serialized).map_err(ConfigError::WriteError)
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject settings that would leave nothing to write.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tile = &self.tile;
        if tile.width == 0 || tile.height == 0 {
            return Err(ConfigError::Invalid {
                field: "tile",
                reason: format!("size {}x{} is empty", tile.width, tile.height),
            });
        }
        if tile.texture_width < 2 || tile.texture_height < 2 {
            return Err(ConfigError::Invalid {
                field: "tile.texture_width",
                reason: format!(
                    "texture {}x{} needs at least 2x2 pixels",
                    tile.texture_width, tile.texture_height
                ),
            });
        }
        if !tile.origin_x.is_finite() || !tile.origin_y.is_finite() {
            return Err(ConfigError::Invalid {
                field: "tile.origin_x",
                reason: "origin must be finite".to_string(),
            });
        }
        Ok(())
    }
}
