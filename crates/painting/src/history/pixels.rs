//! Pixel history items: plain, tile-aware and tile-mapped changes

use crate::document::Document;
use crate::types::{LayerId, PixelRect, TileId};

use super::deltas::{NonTileDelta, PixelRegion, TileDelta, write_non_tile, write_region, write_tile_deltas};

/// Plain pixel-region change on a layer. Never touches tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelChange {
    pub layer_id: LayerId,
    pub regions: Vec<PixelRegion>,
}

impl PixelChange {
    pub fn new(layer_id: LayerId) -> Self {
        Self {
            layer_id,
            regions: Vec::new(),
        }
    }

    /// Record a region; regions whose before and after match are dropped
    pub fn add_region(&mut self, region: PixelRegion) {
        if !region.is_noop() {
            self.regions.push(region);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn memory_size(&self) -> usize {
        self.regions.iter().map(PixelRegion::memory_size).sum()
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        // Undo walks regions back to front so overlapping regions restore correctly
        let mut dirty = PixelRect::EMPTY;
        if forward {
            for region in &self.regions {
                dirty = dirty.union(&write_region(doc, self.layer_id, region, true));
            }
        } else {
            for region in self.regions.iter().rev() {
                dirty = dirty.union(&write_region(doc, self.layer_id, region, false));
            }
        }
        dirty
    }
}

/// A rectangle written through the tile-aware path: the layer pixels plus
/// the canonical definitions the write propagated into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileAwarePixelChange {
    pub layer_id: LayerId,
    pub region: PixelRegion,
    pub tile_deltas: Vec<TileDelta>,
}

impl TileAwarePixelChange {
    pub fn is_empty(&self) -> bool {
        self.region.is_noop() && self.tile_deltas.is_empty()
    }

    pub fn memory_size(&self) -> usize {
        self.region.memory_size() + self.tile_deltas.iter().map(TileDelta::memory_size).sum::<usize>()
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        let dirty = write_region(doc, self.layer_id, &self.region, forward);
        dirty.union(&write_tile_deltas(doc, self.layer_id, &self.tile_deltas, forward))
    }
}

/// One gesture on a tile-mapped layer: free-pixel deltas outside mapped
/// cells plus whole-tile deltas for every definition the gesture changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMappedPixelChange {
    pub layer_id: LayerId,
    pub non_tile: Vec<NonTileDelta>,
    pub tile_deltas: Vec<TileDelta>,
}

impl TileMappedPixelChange {
    pub fn new(layer_id: LayerId) -> Self {
        Self {
            layer_id,
            non_tile: Vec::new(),
            tile_deltas: Vec::new(),
        }
    }

    pub fn add_non_tile_change(&mut self, offset: usize, before: u32, after: u32) {
        self.non_tile.push(NonTileDelta { offset, before, after });
    }

    pub fn add_tile_delta(&mut self, delta: TileDelta) {
        self.tile_deltas.push(delta);
    }

    /// Tiles whose definitions this change rewrites
    pub fn tile_ids(&self) -> Vec<TileId> {
        self.tile_deltas.iter().map(|delta| delta.tile_id).collect()
    }

    /// True when the gesture changed nothing; such a change is not pushed
    pub fn is_empty(&self) -> bool {
        self.non_tile.is_empty() && self.tile_deltas.is_empty()
    }

    pub fn memory_size(&self) -> usize {
        self.non_tile.len() * std::mem::size_of::<NonTileDelta>()
            + self.tile_deltas.iter().map(TileDelta::memory_size).sum::<usize>()
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        let dirty = write_non_tile(doc, self.layer_id, &self.non_tile, forward);
        dirty.union(&write_tile_deltas(doc, self.layer_id, &self.tile_deltas, forward))
    }
}
