//! Tile-set CRUD, per-layer mappings and tile stamping

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::PaintError;
use crate::history::{Change, HistoryItem, MappingChange, PixelRegion, TileStampChange};
use crate::propagation::sync_instances;
use crate::tiles::{SubscriptionId, TileMapping, TileSet, TileSetEvent};
use crate::types::{LayerId, PixelRect, TileCoord, TileId};

use super::PaintContext;

impl PaintContext {
    fn tiles(&self) -> Result<&TileSet, PaintError> {
        self.document.tile_set().ok_or(PaintError::NoTileSet)
    }

    fn tiles_mut(&mut self) -> Result<&mut TileSet, PaintError> {
        self.document.tile_set_mut().ok_or(PaintError::NoTileSet)
    }

    /// Grid size, or an error if `coord` is outside it
    fn check_cell(&self, coord: TileCoord) -> Result<(u32, u32), PaintError> {
        let (grid_w, grid_h) = self.document.tile_grid_size().ok_or(PaintError::NoTileSet)?;
        if coord.x >= grid_w || coord.y >= grid_h {
            return Err(PaintError::CellOutOfRange {
                x: coord.x,
                y: coord.y,
            });
        }
        Ok((grid_w, grid_h))
    }

    /// All tile ids in ascending order (empty without a tile set)
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.document.tile_set().map(TileSet::ids).unwrap_or_default()
    }

    /// Canonical pixels of a tile; None for unknown ids
    pub fn tile_pixels(&self, id: TileId) -> Option<&[u8]> {
        self.document.tile_set()?.tile_pixels(id)
    }

    pub fn create_tile(&mut self, pixels: Vec<u8>) -> Result<TileId, PaintError> {
        self.tiles_mut()?.create_tile(pixels)
    }

    pub fn create_empty_tile(&mut self) -> Result<TileId, PaintError> {
        Ok(self.tiles_mut()?.create_empty_tile())
    }

    /// Copy a tile under a new id; None for unknown ids
    pub fn duplicate_tile(&mut self, id: TileId) -> Result<Option<TileId>, PaintError> {
        Ok(self.tiles_mut()?.duplicate_tile(id))
    }

    /// Delete a tile. Every mapping cell referencing it on every layer is
    /// cleared first; the cell pixels are left as they are.
    /// Returns false if the id did not exist.
    pub fn delete_tile(&mut self, id: TileId) -> Result<bool, PaintError> {
        self.ensure_idle()?;
        if !self.tiles()?.contains(id) {
            return Ok(false);
        }
        let mut cleared = 0;
        for layer in &mut self.document.layers {
            if let Some(mapping) = layer.mapping.as_mut() {
                cleared += mapping.replace_id(id, None).len();
            }
        }
        self.tiles_mut()?.remove_tile(id);
        info!("Context: deleted tile {} ({} cell(s) unmapped)", id, cleared);
        Ok(true)
    }

    /// Replace a tile's canonical pixels and re-blit every mapped instance
    /// on every layer. Returns false if the id did not exist.
    pub fn update_tile_pixels(&mut self, id: TileId, pixels: Vec<u8>) -> Result<bool, PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        if !self.tiles_mut()?.update_tile_pixels(id, pixels)? {
            return Ok(false);
        }
        let dirty = sync_instances(&mut self.document, None, &[id]);
        self.invalidate(dirty);
        Ok(true)
    }

    /// Observe tile-set changes
    pub fn subscribe_tiles<F>(&mut self, listener: F) -> Result<SubscriptionId, PaintError>
    where
        F: Fn(&TileSetEvent) + Send + Sync + 'static,
    {
        Ok(self.tiles_mut()?.subscribe(listener))
    }

    pub fn unsubscribe_tiles(&mut self, id: SubscriptionId) -> bool {
        self.document
            .tile_set_mut()
            .is_some_and(|tile_set| tile_set.unsubscribe(id))
    }

    pub fn tile_mapping(&self, layer_id: LayerId) -> Option<&TileMapping> {
        self.document.layer(layer_id)?.mapping.as_ref()
    }

    /// Give a layer a canvas-sized mapping if it has none
    pub fn ensure_mapping(&mut self, layer_id: LayerId) -> Result<(), PaintError> {
        self.document.ensure_mapping(layer_id).map(|_| ())
    }

    /// Remove a layer's mapping entirely; its pixels become free pixels
    pub fn remove_mapping(&mut self, layer_id: LayerId) -> Result<Option<TileMapping>, PaintError> {
        self.ensure_idle()?;
        Ok(self.document.layer_mut_or_err(layer_id)?.mapping.take())
    }

    pub fn mapping_cell(&self, layer_id: LayerId, coord: TileCoord) -> Option<TileId> {
        self.tile_mapping(layer_id)?.get(coord)
    }

    /// Assign a mapping cell directly, without touching pixels or history.
    /// Returns the previous value.
    pub fn set_mapping_cell(&mut self, layer_id: LayerId, coord: TileCoord, id: Option<TileId>) -> Result<Option<TileId>, PaintError> {
        if let Some(id) = id {
            if !self.tiles()?.contains(id) {
                return Err(PaintError::TileNotFound(id));
            }
        }
        let mapping = self.document.ensure_mapping(layer_id)?;
        Ok(mapping.set(coord, id))
    }

    pub fn clear_mapping_cell(&mut self, layer_id: LayerId, coord: TileCoord) -> Result<Option<TileId>, PaintError> {
        self.set_mapping_cell(layer_id, coord, None)
    }

    /// Tile mapped under a document pixel of a layer
    pub fn sample_tile_at(&self, layer_id: LayerId, x: i32, y: i32) -> Option<TileId> {
        let coord = self.document.doc_to_tile(x, y)?;
        self.mapping_cell(layer_id, coord)
    }

    /// Map `tile` into a cell of the active layer (or unmap it with None),
    /// writing the tile's pixels into the cell block. Records one history item.
    pub fn stamp_tile(&mut self, coord: TileCoord, tile: Option<TileId>) -> Result<bool, PaintError> {
        self.ensure_idle()?;
        let layer_id = self.document.active_layer_id();
        let (tile_w, tile_h) = self.document.tile_size().ok_or(PaintError::NoTileSet)?;
        let (grid_w, grid_h) = self.check_cell(coord)?;

        let mut tile_states = BTreeMap::new();
        if let Some(id) = tile {
            let pixels = self.tile_pixels(id).ok_or(PaintError::TileNotFound(id))?;
            tile_states.insert(id, pixels.to_vec());
        }

        let rect = PixelRect::new(
            (coord.x * tile_w) as i32,
            (coord.y * tile_h) as i32,
            tile_w as i32,
            tile_h as i32,
        )
        .clamp_to(self.document.width(), self.document.height());
        let before = self.read_pixels(layer_id, rect)?;

        let layer = self.document.layer_mut_or_err(layer_id)?;
        let mapping = layer
            .mapping
            .get_or_insert_with(|| TileMapping::new(grid_w, grid_h));
        let previous = mapping.set(coord, tile);
        if let Some(pixels) = tile.and_then(|id| tile_states.get(&id)) {
            layer.write_tile_block(coord, tile_w, tile_h, pixels)?;
        }
        let after = self.read_pixels(layer_id, rect)?;

        let change = TileStampChange {
            layer_id,
            region: PixelRegion { rect, before, after },
            mapping_change: Some(MappingChange {
                coord,
                before: previous,
                after: tile,
            }),
            tile_states,
        };
        debug!("Context: stamped {:?} at {:?}", tile, coord);
        self.invalidate(rect);
        let description = if tile.is_some() { "Stamp tile" } else { "Unmap tile" };
        Ok(self
            .history
            .push(HistoryItem::new(description, Change::TileStamp(change))))
    }

    /// Create a new tile from a cell's current pixels on the active layer and
    /// map it there. The new definition survives undo; ids are never reused.
    pub fn capture_tile(&mut self, coord: TileCoord) -> Result<TileId, PaintError> {
        self.ensure_idle()?;
        let layer_id = self.document.active_layer_id();
        let (tile_w, tile_h) = self.document.tile_size().ok_or(PaintError::NoTileSet)?;
        self.check_cell(coord)?;
        let pixels = self
            .document
            .layer_or_err(layer_id)?
            .read_tile_block(coord, tile_w, tile_h);
        let id = self.tiles_mut()?.create_tile(pixels)?;
        self.stamp_tile(coord, Some(id))?;
        Ok(id)
    }
}
