//! Pixtile painting core - tile-mapped pixel editing
//!
//! This crate provides the document model and editing engine:
//! - [`surface`] - CPU BGRA pixel surfaces
//! - [`tiles`] - Tile definitions, per-layer tile mappings and change events
//! - [`propagation`] - Keeps every instance of a tile in sync after an edit
//! - [`stroke`] - Live stroke tracking for press-move-release gestures
//! - [`history`] - Unified undo/redo stack and its history items
//! - [`selection`] / [`floating`] - Selection regions and floating selections
//! - [`persistence`] - JSON document files
//! - [`context`] - The editing context tools talk to

pub mod constants;
pub mod context;
pub mod document;
pub mod error;
pub mod floating;
pub mod history;
pub mod layer;
pub mod persistence;
pub mod propagation;
pub mod selection;
pub mod stroke;
pub mod surface;
pub mod tiles;
pub mod types;

pub use constants::*;
pub use context::{CanvasHost, NullHost, PaintContext};
pub use document::Document;
pub use error::{PaintError, PaintResult};
pub use floating::{FloatingSelection, FloatingTransform, NearestNeighborTransform, TransformedFloat};
pub use history::{Change, HistoryItem, HistoryStack, Traversal};
pub use layer::RasterLayer;
pub use persistence::DocumentFile;
pub use propagation::{PropagationReport, propagate_region};
pub use selection::{SelectionRegion, Span};
pub use stroke::{LiveStrokeTracker, StrokeOutcome, StrokeSnapshot};
pub use surface::PixelSurface;
pub use tiles::{SubscriptionId, TileDefinition, TileMapping, TileSet, TileSetEvent};
pub use types::*;
