//! Document: canvas geometry, layers, the tile set and selection state

use tracing::info;

use pixtile_config::EditorConfig;

use crate::constants::DEFAULT_LAYER_NAME;
use crate::error::PaintError;
use crate::floating::FloatingSelection;
use crate::layer::{RasterLayer, tile_block_rect};
use crate::propagation::sync_instances;
use crate::selection::SelectionRegion;
use crate::tiles::{TileMapping, TileSet};
use crate::types::{LayerId, PixelRect, TileCoord};

/// A pixel-art document.
///
/// Layers are ordered bottom to top. Layer ids come from a monotonic
/// counter and stay stable across reordering.
#[derive(Debug)]
pub struct Document {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) tile_set: Option<TileSet>,
    pub(crate) layers: Vec<RasterLayer>,
    pub(crate) active_layer: LayerId,
    pub(crate) selection: SelectionRegion,
    pub(crate) floating: Option<FloatingSelection>,
    pub(crate) next_layer_id: u64,
}

impl Document {
    /// Create a document with a single empty layer and no tile set
    pub fn new(width: u32, height: u32) -> Result<Self, PaintError> {
        if width == 0 || height == 0 {
            return Err(PaintError::InvalidDimensions { width, height });
        }
        let first = RasterLayer::new(LayerId(0), DEFAULT_LAYER_NAME, width, height);
        Ok(Self {
            width,
            height,
            tile_set: None,
            layers: vec![first],
            active_layer: LayerId(0),
            selection: SelectionRegion::new(),
            floating: None,
            next_layer_id: 1,
        })
    }

    /// Create a document with a tile set of the given tile size
    pub fn with_tiles(width: u32, height: u32, tile_width: u32, tile_height: u32) -> Result<Self, PaintError> {
        let mut document = Self::new(width, height)?;
        document.tile_set = Some(TileSet::new(tile_width, tile_height)?);
        Ok(document)
    }

    /// Create a document from editor settings
    pub fn from_config(config: &EditorConfig) -> Result<Self, PaintError> {
        config.validate()?;
        if config.tiles.enabled {
            Self::with_tiles(
                config.canvas.width,
                config.canvas.height,
                config.tiles.width,
                config.tiles.height,
            )
        } else {
            Self::new(config.canvas.width, config.canvas.height)
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::of_size(self.width, self.height)
    }

    pub fn tile_set(&self) -> Option<&TileSet> {
        self.tile_set.as_ref()
    }

    pub fn tile_set_mut(&mut self) -> Option<&mut TileSet> {
        self.tile_set.as_mut()
    }

    /// Tile pixel size, if the document has a tile set
    pub fn tile_size(&self) -> Option<(u32, u32)> {
        self.tile_set
            .as_ref()
            .map(|set| (set.tile_width(), set.tile_height()))
    }

    /// Number of tile-grid columns and rows covering the canvas
    pub fn tile_grid_size(&self) -> Option<(u32, u32)> {
        let (tile_w, tile_h) = self.tile_size()?;
        Some((self.width.div_ceil(tile_w), self.height.div_ceil(tile_h)))
    }

    /// Tile-grid cell containing a document pixel
    pub fn doc_to_tile(&self, x: i32, y: i32) -> Option<TileCoord> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        let (tile_w, tile_h) = self.tile_size()?;
        Some(TileCoord::new(x as u32 / tile_w, y as u32 / tile_h))
    }

    /// Document rectangle of a tile-grid cell (may extend past the canvas edge)
    pub fn tile_rect(&self, coord: TileCoord) -> Option<PixelRect> {
        let (tile_w, tile_h) = self.tile_size()?;
        Some(tile_block_rect(coord, tile_w, tile_h))
    }

    pub fn layers(&self) -> &[RasterLayer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, id: LayerId) -> Option<&RasterLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut RasterLayer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    pub fn layer_index(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub(crate) fn layer_or_err(&self, id: LayerId) -> Result<&RasterLayer, PaintError> {
        self.layer(id).ok_or(PaintError::LayerNotFound(id))
    }

    pub(crate) fn layer_mut_or_err(&mut self, id: LayerId) -> Result<&mut RasterLayer, PaintError> {
        self.layer_mut(id).ok_or(PaintError::LayerNotFound(id))
    }

    /// Mutable layer together with the tile set, for edits touching both
    pub(crate) fn layer_and_tiles_mut(
        &mut self,
        id: LayerId,
    ) -> Option<(&mut RasterLayer, Option<&mut TileSet>)> {
        let layer = self.layers.iter_mut().find(|layer| layer.id == id)?;
        Some((layer, self.tile_set.as_mut()))
    }

    #[inline]
    pub fn active_layer_id(&self) -> LayerId {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<(), PaintError> {
        self.layer_or_err(id)?;
        self.active_layer = id;
        Ok(())
    }

    pub fn selection(&self) -> &SelectionRegion {
        &self.selection
    }

    pub fn floating(&self) -> Option<&FloatingSelection> {
        self.floating.as_ref()
    }

    /// Allocate a new empty layer (not yet inserted)
    pub fn create_layer(&mut self, name: impl Into<String>) -> RasterLayer {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        RasterLayer::new(id, name, self.width, self.height)
    }

    /// Insert a layer at `index` (clamped to the layer count)
    pub fn insert_layer(&mut self, index: usize, layer: RasterLayer) {
        let index = index.min(self.layers.len());
        self.next_layer_id = self.next_layer_id.max(layer.id.0 + 1);
        info!("Document: inserted layer {} at {}", layer.id, index);
        self.layers.insert(index, layer);
    }

    /// Remove a layer, returning it and its former index.
    /// The last remaining layer cannot be removed.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<(usize, RasterLayer), PaintError> {
        let index = self.layer_index(id).ok_or(PaintError::LayerNotFound(id))?;
        if self.layers.len() == 1 {
            return Err(PaintError::LastLayer);
        }
        let layer = self.layers.remove(index);
        if self.active_layer == id {
            let fallback = index.min(self.layers.len() - 1);
            self.active_layer = self.layers[fallback].id;
        }
        info!("Document: removed layer {} from {}", id, index);
        Ok((index, layer))
    }

    /// Move a layer to a new index (clamped); returns the old index
    pub fn move_layer(&mut self, id: LayerId, to: usize) -> Result<usize, PaintError> {
        let from = self.layer_index(id).ok_or(PaintError::LayerNotFound(id))?;
        let to = to.min(self.layers.len() - 1);
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        Ok(from)
    }

    /// Give a layer a tile mapping sized to the canvas if it has none
    pub fn ensure_mapping(&mut self, id: LayerId) -> Result<&mut TileMapping, PaintError> {
        let (tile_w, tile_h) = self.tile_size().ok_or(PaintError::NoTileSet)?;
        let (width, height) = (self.width, self.height);
        let layer = self.layer_mut_or_err(id)?;
        Ok(layer
            .mapping
            .get_or_insert_with(|| TileMapping::for_document(width, height, tile_w, tile_h)))
    }

    /// Resize the canvas, anchored top-left. Layer surfaces and mapping
    /// grids are cropped or extended; the selection is clipped. Mapped cells
    /// are re-blitted from their definitions so edge cells uncovered by a
    /// larger canvas show the full tile.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), PaintError> {
        if width == 0 || height == 0 {
            return Err(PaintError::InvalidDimensions { width, height });
        }
        let (tile_w, tile_h) = self.tile_size().unwrap_or((1, 1));
        for layer in &mut self.layers {
            layer.resize(width, height, tile_w, tile_h);
        }
        self.width = width;
        self.height = height;
        self.selection.clip_to(width, height);
        let ids = self.tile_set.as_ref().map(TileSet::ids).unwrap_or_default();
        sync_instances(self, None, &ids);
        info!("Document: resized canvas to {}x{}", width, height);
        Ok(())
    }
}
