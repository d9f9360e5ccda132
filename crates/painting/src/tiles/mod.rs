//! Tile definitions and per-layer tile mappings
//!
//! - [`TileSet`] owns the canonical pixels of every tile definition
//! - [`TileMapping`] assigns tile ids to the cells of a layer's tile grid
//! - [`TileSetEvent`] notifies observers when definitions change

mod events;
mod mapping;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::PaintError;
use crate::surface::buffer_len;
use crate::types::TileId;

pub use events::{SubscriptionId, TileSetEvent};
pub use mapping::TileMapping;

use events::TileListeners;

/// Canonical pixel content of one tile id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDefinition {
    pub id: TileId,
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl TileDefinition {
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Owns every tile definition of a document.
///
/// Tile dimensions are fixed at creation. Ids are allocated from a
/// monotonically increasing counter so deleted ids are never recycled.
#[derive(Debug)]
pub struct TileSet {
    tile_width: u32,
    tile_height: u32,
    /// Ordered by id so iteration is deterministic (ascending)
    tiles: BTreeMap<TileId, TileDefinition>,
    next_id: u32,
    listeners: TileListeners,
}

impl TileSet {
    /// Create an empty tile set with the given tile size
    pub fn new(tile_width: u32, tile_height: u32) -> Result<Self, PaintError> {
        if tile_width == 0 || tile_height == 0 {
            return Err(PaintError::InvalidDimensions {
                width: tile_width,
                height: tile_height,
            });
        }
        Ok(Self {
            tile_width,
            tile_height,
            tiles: BTreeMap::new(),
            next_id: 0,
            listeners: TileListeners::default(),
        })
    }

    /// Rebuild a set from persisted parts, keeping the id counter
    pub(crate) fn from_parts(
        tile_width: u32,
        tile_height: u32,
        next_id: u32,
        tiles: Vec<(TileId, Vec<u8>)>,
    ) -> Result<Self, PaintError> {
        let mut set = Self::new(tile_width, tile_height)?;
        for (id, pixels) in tiles {
            set.check_len(&pixels)?;
            set.tiles.insert(
                id,
                TileDefinition {
                    id,
                    width: tile_width,
                    height: tile_height,
                    pixels,
                },
            );
            set.next_id = set.next_id.max(id.0 + 1);
        }
        set.next_id = set.next_id.max(next_id);
        Ok(set)
    }

    #[inline]
    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    #[inline]
    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Byte length of one tile's pixel buffer
    #[inline]
    pub fn tile_byte_len(&self) -> usize {
        buffer_len(self.tile_width, self.tile_height)
    }

    /// The id the next created tile will get
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.contains_key(&id)
    }

    /// All tile ids in ascending order
    pub fn ids(&self) -> Vec<TileId> {
        self.tiles.keys().copied().collect()
    }

    pub fn get(&self, id: TileId) -> Option<&TileDefinition> {
        self.tiles.get(&id)
    }

    /// Canonical pixels of a tile, or None if the id does not exist
    pub fn tile_pixels(&self, id: TileId) -> Option<&[u8]> {
        self.tiles.get(&id).map(|tile| tile.pixels.as_slice())
    }

    /// Copy of every definition's pixels, keyed by id
    pub fn snapshot(&self) -> BTreeMap<TileId, Vec<u8>> {
        self.tiles
            .iter()
            .map(|(id, tile)| (*id, tile.pixels.clone()))
            .collect()
    }

    /// Create a tile from a pixel buffer of exactly one tile
    pub fn create_tile(&mut self, pixels: Vec<u8>) -> Result<TileId, PaintError> {
        self.check_len(&pixels)?;
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.insert(
            id,
            TileDefinition {
                id,
                width: self.tile_width,
                height: self.tile_height,
                pixels,
            },
        );
        debug!("TileSet: created tile {}", id);
        self.listeners.emit(TileSetEvent::TileAdded { id });
        Ok(id)
    }

    /// Create a fully transparent tile
    pub fn create_empty_tile(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        self.tiles.insert(
            id,
            TileDefinition {
                id,
                width: self.tile_width,
                height: self.tile_height,
                pixels: vec![0; self.tile_byte_len()],
            },
        );
        self.listeners.emit(TileSetEvent::TileAdded { id });
        id
    }

    /// Copy an existing tile under a new id
    pub fn duplicate_tile(&mut self, id: TileId) -> Option<TileId> {
        let pixels = self.tile_pixels(id)?.to_vec();
        self.create_tile(pixels).ok()
    }

    /// Remove a definition and return its pixels.
    ///
    /// Callers must clear or reassign mapping cells referencing `id` first.
    pub fn remove_tile(&mut self, id: TileId) -> Option<Vec<u8>> {
        let tile = self.tiles.remove(&id)?;
        debug!("TileSet: removed tile {}", id);
        self.listeners.emit(TileSetEvent::TileRemoved { id });
        Some(tile.pixels)
    }

    /// Replace a tile's canonical pixels and raise `TileUpdated`.
    ///
    /// Returns `Ok(false)` if the id does not exist (lookup miss, not an error).
    pub fn update_tile_pixels(&mut self, id: TileId, pixels: Vec<u8>) -> Result<bool, PaintError> {
        self.check_len(&pixels)?;
        let Some(tile) = self.tiles.get_mut(&id) else {
            return Ok(false);
        };
        tile.pixels = pixels;
        self.listeners.emit(TileSetEvent::TileUpdated { id });
        Ok(true)
    }

    /// Register an observer for tile changes
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&TileSetEvent) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Remove an observer. Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Number of registered observers
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn check_len(&self, pixels: &[u8]) -> Result<(), PaintError> {
        let expected = self.tile_byte_len();
        if pixels.len() != expected {
            return Err(PaintError::PixelBufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(())
    }
}
