//! Before/after records shared by history items, and the helpers that
//! write them back into a document

use tracing::warn;

use crate::constants::BYTES_PER_PIXEL;
use crate::document::Document;
use crate::propagation::{blit_positions, sync_instances};
use crate::types::{LayerId, PixelRect, TileCoord, TileId, pack_bgra, unpack_bgra};

/// Layer pixels of one rectangle before and after an edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelRegion {
    pub rect: PixelRect,
    pub before: Vec<u8>,
    pub after: Vec<u8>,
}

impl PixelRegion {
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }

    pub fn memory_size(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub(crate) fn pixels(&self, forward: bool) -> &[u8] {
        if forward { &self.after } else { &self.before }
    }
}

/// Canonical pixels of one tile before and after an edit, with every cell
/// mapped to it so all instances can be rewritten directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDelta {
    pub tile_id: TileId,
    pub before: Vec<u8>,
    pub after: Vec<u8>,
    pub positions: Vec<TileCoord>,
}

impl TileDelta {
    pub fn memory_size(&self) -> usize {
        self.before.len() + self.after.len() + self.positions.len() * std::mem::size_of::<TileCoord>()
    }
}

/// One free (unmapped) pixel changed by a stroke, keyed by byte offset in
/// the layer surface. Colors are packed BGRA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonTileDelta {
    pub offset: usize,
    pub before: u32,
    pub after: u32,
}

/// Write a rectangle of pixels into a layer without propagation
pub(crate) fn write_region(doc: &mut Document, layer_id: LayerId, region: &PixelRegion, forward: bool) -> PixelRect {
    let Some(layer) = doc.layer_mut(layer_id) else {
        warn!("History: layer {} no longer exists", layer_id);
        return PixelRect::EMPTY;
    };
    match layer.surface.write_rect(region.rect, region.pixels(forward)) {
        Ok(()) => region.rect.clamp_to(layer.surface.width(), layer.surface.height()),
        Err(err) => {
            warn!("History: region write rejected: {}", err);
            PixelRect::EMPTY
        }
    }
}

/// Write individual free pixels into a layer
pub(crate) fn write_non_tile(doc: &mut Document, layer_id: LayerId, deltas: &[NonTileDelta], forward: bool) -> PixelRect {
    let Some(layer) = doc.layer_mut(layer_id) else {
        warn!("History: layer {} no longer exists", layer_id);
        return PixelRect::EMPTY;
    };
    let width = layer.surface.width() as usize;
    let mut dirty = PixelRect::EMPTY;
    let pixels = layer.surface.pixels_mut();
    for delta in deltas {
        let end = delta.offset + BYTES_PER_PIXEL;
        if end > pixels.len() {
            continue;
        }
        let color = if forward { delta.after } else { delta.before };
        pixels[delta.offset..end].copy_from_slice(&unpack_bgra(color));

        let index = delta.offset / BYTES_PER_PIXEL;
        let (x, y) = ((index % width) as i32, (index / width) as i32);
        dirty = dirty.union(&PixelRect::new(x, y, 1, 1));
    }
    dirty
}

/// Restore canonical tile pixels and re-blit every recorded instance.
///
/// When a tile no longer exists its recorded cells are written as free
/// pixels instead, skipping cells that now map another tile.
pub(crate) fn write_tile_deltas(doc: &mut Document, layer_id: LayerId, deltas: &[TileDelta], forward: bool) -> PixelRect {
    if deltas.is_empty() {
        return PixelRect::EMPTY;
    }
    let Some((layer, Some(tile_set))) = doc.layer_and_tiles_mut(layer_id) else {
        warn!("History: layer {} or tile set missing, tile deltas skipped", layer_id);
        return PixelRect::EMPTY;
    };

    let (tile_w, tile_h) = (tile_set.tile_width(), tile_set.tile_height());
    let mut dirty = PixelRect::EMPTY;
    let mut restored = Vec::with_capacity(deltas.len());
    for delta in deltas {
        let pixels = if forward { &delta.after } else { &delta.before };
        let positions = match tile_set.update_tile_pixels(delta.tile_id, pixels.clone()) {
            Ok(true) => {
                restored.push(delta.tile_id);
                delta.positions.clone()
            }
            Ok(false) => {
                warn!("History: tile {} no longer exists, writing its cells as free pixels", delta.tile_id);
                delta
                    .positions
                    .iter()
                    .copied()
                    .filter(|coord| {
                        layer
                            .mapping
                            .as_ref()
                            .is_none_or(|mapping| mapping.get(*coord).is_none())
                    })
                    .collect()
            }
            Err(err) => {
                warn!("History: tile {} rejected: {}", delta.tile_id, err);
                continue;
            }
        };
        dirty = dirty.union(&blit_positions(layer, &positions, pixels, tile_w, tile_h));
    }

    dirty.union(&sync_instances(doc, Some(layer_id), &restored))
}

/// Pack a pixel read from a byte buffer
#[inline]
pub(crate) fn packed_at(buffer: &[u8], offset: usize) -> u32 {
    let mut pixel = [0u8; 4];
    pixel.copy_from_slice(&buffer[offset..offset + BYTES_PER_PIXEL]);
    pack_bgra(pixel)
}
