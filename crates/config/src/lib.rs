//! Shared configuration for Pixtile
//!
//! This crate provides the single source of truth for the settings a new
//! document is created with: canvas dimensions, tile geometry and the depth
//! of the undo history.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default canvas width in pixels
pub const DEFAULT_CANVAS_WIDTH: u32 = 64;

/// Default canvas height in pixels
pub const DEFAULT_CANVAS_HEIGHT: u32 = 64;

/// Default tile edge length in pixels
pub const DEFAULT_TILE_SIZE: u32 = 16;

/// Default number of undo steps kept (0 = unlimited)
pub const DEFAULT_MAX_HISTORY_ITEMS: usize = 100;

/// Largest canvas edge accepted by [`EditorConfig::validate`].
pub const MAX_CANVAS_SIZE: u32 = 8192;

/// Error type for loading and validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid canvas size {width}x{height} (each edge must be 1..={max})", max = MAX_CANVAS_SIZE)]
    InvalidCanvasSize { width: u32, height: u32 },

    #[error("Invalid tile size {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },
}

/// Canvas dimensions for new documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

/// Tile geometry for the document tile set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Whether new documents get a tile set at all
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
        }
    }
}

/// Undo history settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of items kept; the oldest are dropped first. 0 = unlimited.
    pub max_items: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_HISTORY_ITEMS,
        }
    }
}

impl HistoryConfig {
    /// The limit as an option, `None` meaning unbounded
    pub fn limit(&self) -> Option<usize> {
        (self.max_items > 0).then_some(self.max_items)
    }
}

/// Editor configuration for new documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub canvas: CanvasConfig,
    pub tiles: TileConfig,
    pub history: HistoryConfig,
}

impl EditorConfig {
    /// Create a config with the given canvas dimensions and default everything else
    pub fn with_canvas(width: u32, height: u32) -> Self {
        Self {
            canvas: CanvasConfig { width, height },
            ..Self::default()
        }
    }

    /// Parse a config from JSON. Missing fields fall back to defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that all dimensions are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let CanvasConfig { width, height } = self.canvas;
        if width == 0 || height == 0 || width > MAX_CANVAS_SIZE || height > MAX_CANVAS_SIZE {
            return Err(ConfigError::InvalidCanvasSize { width, height });
        }

        if self.tiles.enabled {
            let TileConfig { width, height, .. } = self.tiles;
            if width == 0 || height == 0 || width > self.canvas.width || height > self.canvas.height {
                return Err(ConfigError::InvalidTileSize { width, height });
            }
        }

        Ok(())
    }

    /// Tile-grid dimensions for the configured canvas (ceil division)
    pub fn tile_grid_size(&self) -> (u32, u32) {
        let tiles_x = self.canvas.width.div_ceil(self.tiles.width.max(1));
        let tiles_y = self.canvas.height.div_ceil(self.tiles.height.max(1));
        (tiles_x, tiles_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.canvas.width, DEFAULT_CANVAS_WIDTH);
        assert_eq!(config.canvas.height, DEFAULT_CANVAS_HEIGHT);
        assert_eq!(config.tiles.width, DEFAULT_TILE_SIZE);
        assert!(config.tiles.enabled);
        assert_eq!(config.history.limit(), Some(DEFAULT_MAX_HISTORY_ITEMS));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json_str(r#"{ "canvas": { "width": 32 } }"#).unwrap();
        assert_eq!(config.canvas.width, 32);
        assert_eq!(config.canvas.height, DEFAULT_CANVAS_HEIGHT);
        assert_eq!(config.tiles, TileConfig::default());
    }

    #[test]
    fn test_unlimited_history() {
        let config = EditorConfig::from_json_str(r#"{ "history": { "max_items": 0 } }"#).unwrap();
        assert_eq!(config.history.limit(), None);
    }

    #[test]
    fn test_rejects_zero_canvas() {
        let result = EditorConfig::from_json_str(r#"{ "canvas": { "width": 0, "height": 10 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidCanvasSize { .. })));
    }

    #[test]
    fn test_rejects_tile_larger_than_canvas() {
        let mut config = EditorConfig::with_canvas(8, 8);
        config.tiles.width = 16;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTileSize { .. })));

        // Disabled tiles are not checked
        config.tiles.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tile_grid_size_rounds_up() {
        let mut config = EditorConfig::with_canvas(40, 33);
        config.tiles.width = 16;
        config.tiles.height = 16;
        assert_eq!(config.tile_grid_size(), (3, 3));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EditorConfig::with_canvas(128, 96);
        let json = config.to_json_string().unwrap();
        assert_eq!(EditorConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EditorConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
