//! Error types for the painting core.
//!
//! Out-of-canvas pixel coordinates and stale tile ids inside history items
//! are not errors: those are clipped, reported with `Option` or skipped.
//! `PaintError` covers API misuse and persistence failures.

use crate::types::{LayerId, TileId};

/// Errors that can occur in painting, history and persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum PaintError {
    #[error("Layer {0} not found")]
    LayerNotFound(LayerId),

    #[error("Document has no tile set")]
    NoTileSet,

    #[error("Tile {0} not found")]
    TileNotFound(TileId),

    #[error("Tile cell ({x}, {y}) is outside the grid")]
    CellOutOfRange { x: u32, y: u32 },

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    PixelBufferSize { expected: usize, actual: usize },

    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Stroke already active - end or cancel it first")]
    StrokeAlreadyActive,

    #[error("No active stroke - begin one first")]
    NoActiveStroke,

    #[error("A floating selection is active - commit or cancel it first")]
    FloatingSelectionActive,

    #[error("No floating selection")]
    NoFloatingSelection,

    #[error("Selection is empty")]
    EmptySelection,

    #[error("Cannot remove the last layer")]
    LastLayer,

    #[error("Invalid config: {0}")]
    Config(#[from] pixtile_config::ConfigError),

    #[error("Document (de)serialization failed: {0}")]
    Persistence(#[from] serde_json::Error),

    #[error("Corrupt document: {0}")]
    Corrupt(String),
}

/// Result type for painting operations
pub type PaintResult<T> = Result<T, PaintError>;
