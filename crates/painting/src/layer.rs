//! Raster layers: an authoritative pixel surface plus an optional tile mapping

use crate::error::PaintError;
use crate::surface::PixelSurface;
use crate::tiles::TileMapping;
use crate::types::{LayerId, PixelRect, TileCoord};

/// Document-space rectangle covered by a tile-grid cell
#[inline]
pub fn tile_block_rect(coord: TileCoord, tile_width: u32, tile_height: u32) -> PixelRect {
    PixelRect::new(
        (coord.x * tile_width) as i32,
        (coord.y * tile_height) as i32,
        tile_width as i32,
        tile_height as i32,
    )
}

/// A single raster layer.
///
/// Wherever the mapping references a tile, the matching block of `surface`
/// equals that tile's canonical pixels once propagation has completed.
#[derive(Debug, Clone)]
pub struct RasterLayer {
    pub id: LayerId,
    pub name: String,
    pub visible: bool,
    pub surface: PixelSurface,
    pub mapping: Option<TileMapping>,
}

impl RasterLayer {
    pub fn new(id: LayerId, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            surface: PixelSurface::new(width, height),
            mapping: None,
        }
    }

    #[inline]
    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    /// Read a full tile block. Parts past the canvas edge read as transparent.
    pub fn read_tile_block(&self, coord: TileCoord, tile_width: u32, tile_height: u32) -> Vec<u8> {
        self.surface
            .read_rect(tile_block_rect(coord, tile_width, tile_height))
    }

    /// Write a full tile block, skipping parts past the canvas edge.
    pub fn write_tile_block(
        &mut self,
        coord: TileCoord,
        tile_width: u32,
        tile_height: u32,
        pixels: &[u8],
    ) -> Result<(), PaintError> {
        self.surface
            .write_rect(tile_block_rect(coord, tile_width, tile_height), pixels)
    }

    /// Resize the surface and, if present, the mapping grid (top-left anchored)
    pub fn resize(&mut self, width: u32, height: u32, tile_width: u32, tile_height: u32) {
        self.surface = self.surface.resized(width, height);
        if let Some(mapping) = &self.mapping {
            let grid = TileMapping::for_document(width, height, tile_width, tile_height);
            self.mapping = Some(mapping.resized(grid.width(), grid.height()));
        }
    }
}
