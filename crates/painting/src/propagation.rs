//! Tile propagation - keeps every instance of a tile pixel-identical
//!
//! After an edit to a region of a tile-mapped layer:
//! 1. Find the grid cells intersecting the edited region
//! 2. For each distinct tile id among them (ascending), merge what was painted
//!    at any of its instances into a copy of the canonical pixels
//! 3. Store the merged pixels as the new canonical definition
//! 4. Re-blit the definition into every cell referencing the id
//!
//! Only pixels that differ from the current canonical definition are merged.
//! When two instances of the same tile were painted differently by one
//! primitive, instances are visited in ascending row-major grid order and the
//! last one wins.

use tracing::{debug, warn};

use crate::constants::BYTES_PER_PIXEL;
use crate::document::Document;
use crate::layer::{RasterLayer, tile_block_rect};
use crate::tiles::TileSet;
use crate::types::{LayerId, PixelRect, TileCoord, TileId};

/// Summary of one propagation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Tiles whose canonical pixels changed, ascending
    pub updated_tiles: Vec<TileId>,
    /// Grid cells rewritten from a canonical definition
    pub instances_written: usize,
    /// Document area that needs recompositing (may be empty)
    pub dirty: PixelRect,
}

impl PropagationReport {
    pub fn is_noop(&self) -> bool {
        self.updated_tiles.is_empty()
    }
}

/// Propagate an edited region of `layer` into the tile set and all instances.
///
/// A layer without a mapping, or a missing tile set, makes this a no-op.
/// The caller is responsible for recompositing `report.dirty` once.
pub fn propagate_region(layer: &mut RasterLayer, tile_set: Option<&mut TileSet>, edited: PixelRect) -> PropagationReport {
    let mut report = PropagationReport::default();
    let (Some(tile_set), Some(mapping)) = (tile_set, layer.mapping.as_ref()) else {
        return report;
    };

    let edited = edited.clamp_to(layer.surface.width(), layer.surface.height());
    if edited.is_empty() {
        return report;
    }

    let tile_w = tile_set.tile_width();
    let tile_h = tile_set.tile_height();
    let min = TileCoord::new(edited.x as u32 / tile_w, edited.y as u32 / tile_h);
    let max = TileCoord::new(edited.max_x() as u32 / tile_w, edited.max_y() as u32 / tile_h);
    let affected = mapping.ids_in_range(min, max);
    if affected.is_empty() {
        return report;
    }

    // Work list collected up front so the layer surface can be rewritten below
    let work: Vec<(TileId, Vec<TileCoord>)> = affected
        .into_iter()
        .map(|id| (id, mapping.positions_of(id)))
        .collect();

    for (id, positions) in work {
        let Some(canonical) = tile_set.tile_pixels(id) else {
            warn!("Propagation: mapping references missing tile {}", id);
            continue;
        };

        let merged = merge_instances(layer, canonical, &positions, edited, tile_w, tile_h);
        let Some(merged) = merged else {
            continue;
        };

        if positions.len() > 1 {
            report.dirty = report
                .dirty
                .union(&blit_positions(layer, &positions, &merged, tile_w, tile_h));
            report.instances_written += positions.len();
        } else {
            report.dirty = report.dirty.union(&edited);
        }

        // Length always matches: merged starts as a clone of the canonical buffer
        if let Err(err) = tile_set.update_tile_pixels(id, merged) {
            warn!("Propagation: failed to update tile {}: {}", id, err);
            continue;
        }
        report.updated_tiles.push(id);
    }

    if !report.is_noop() {
        debug!(
            "Propagation: {} tile(s) updated, {} instance(s) rewritten",
            report.updated_tiles.len(),
            report.instances_written
        );
    }
    report
}

/// Merge live layer pixels that differ from `canonical` into a copy of it.
/// Returns None if no instance differs.
fn merge_instances(
    layer: &RasterLayer,
    canonical: &[u8],
    positions: &[TileCoord],
    edited: PixelRect,
    tile_w: u32,
    tile_h: u32,
) -> Option<Vec<u8>> {
    let mut merged: Option<Vec<u8>> = None;
    let surface = layer.surface.pixels();
    let surface_w = layer.surface.width() as usize;

    for coord in positions {
        let block = tile_block_rect(*coord, tile_w, tile_h);
        let overlap = block.intersect(&edited);
        if overlap.is_empty() {
            continue;
        }
        for y in overlap.y..overlap.bottom() {
            for x in overlap.x..overlap.right() {
                let local = ((y - block.y) as usize * tile_w as usize + (x - block.x) as usize)
                    * BYTES_PER_PIXEL;
                let live = (y as usize * surface_w + x as usize) * BYTES_PER_PIXEL;
                let live_px = &surface[live..live + BYTES_PER_PIXEL];
                if live_px != &canonical[local..local + BYTES_PER_PIXEL] {
                    let buffer = merged.get_or_insert_with(|| canonical.to_vec());
                    buffer[local..local + BYTES_PER_PIXEL].copy_from_slice(live_px);
                }
            }
        }
    }
    merged
}

/// Write tile pixels into every listed cell of a layer. Returns the
/// document area written (clamped to the canvas).
pub(crate) fn blit_positions(
    layer: &mut RasterLayer,
    positions: &[TileCoord],
    pixels: &[u8],
    tile_w: u32,
    tile_h: u32,
) -> PixelRect {
    let mut dirty = PixelRect::EMPTY;
    let (width, height) = (layer.surface.width(), layer.surface.height());
    for coord in positions {
        if let Err(err) = layer.write_tile_block(*coord, tile_w, tile_h, pixels) {
            warn!("Blit: tile block at {:?} rejected: {}", coord, err);
            continue;
        }
        dirty = dirty.union(&tile_block_rect(*coord, tile_w, tile_h).clamp_to(width, height));
    }
    dirty
}

/// Re-blit the canonical pixels of `ids` into every mapped cell of every
/// layer except `skip`. Returns the document area written.
pub(crate) fn sync_instances(doc: &mut Document, skip: Option<LayerId>, ids: &[TileId]) -> PixelRect {
    let mut dirty = PixelRect::EMPTY;
    let Some(tile_set) = doc.tile_set.as_ref() else {
        return dirty;
    };
    if ids.is_empty() {
        return dirty;
    }

    let (tile_w, tile_h) = (tile_set.tile_width(), tile_set.tile_height());
    for layer in doc.layers.iter_mut().filter(|layer| Some(layer.id) != skip) {
        for id in ids {
            let positions = match &layer.mapping {
                Some(mapping) => mapping.positions_of(*id),
                None => break,
            };
            if positions.is_empty() {
                continue;
            }
            let Some(pixels) = tile_set.tile_pixels(*id) else {
                continue;
            };
            dirty = dirty.union(&blit_positions(layer, &positions, pixels, tile_w, tile_h));
        }
    }
    dirty
}
