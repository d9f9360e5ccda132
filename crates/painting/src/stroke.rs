//! Live stroke tracking
//!
//! Batches a press-move-release gesture into one history item while
//! propagating each primitive to mapped tiles as it is painted:
//! - `begin` snapshots the layer and (for mapped layers) every tile definition
//! - `propagate_live` grows the stroke bounds and propagates one primitive
//! - `end` diffs the final state against the snapshots
//! - `cancel` restores the snapshots

use std::collections::BTreeMap;

use tracing::debug;

use crate::constants::BYTES_PER_PIXEL;
use crate::document::Document;
use crate::error::PaintError;
use crate::history::{Change, HistoryItem, PixelChange, PixelRegion, TileDelta, TileMappedPixelChange, packed_at};
use crate::propagation::{PropagationReport, propagate_region, sync_instances};
use crate::surface::PixelSurface;
use crate::types::{LayerId, PixelRect, TileCoord, TileId};

/// State captured when a stroke begins
#[derive(Debug)]
struct ActiveStroke {
    layer_id: LayerId,
    before_snapshot: PixelSurface,
    tile_before_states: BTreeMap<TileId, Vec<u8>>,
    /// Union of every primitive's bounds, clamped to the canvas
    bounds: PixelRect,
}

/// Layer state from before a stroke on an unmapped area, for callers that
/// record a plain pixel diff instead
#[derive(Debug, Clone)]
pub struct StrokeSnapshot {
    pub layer_id: LayerId,
    pub before: PixelSurface,
    pub bounds: PixelRect,
}

impl StrokeSnapshot {
    /// Diff the stroke bounds against the current layer.
    /// Returns None if nothing changed.
    pub fn into_pixel_change(self, doc: &Document, description: &str) -> Option<HistoryItem> {
        let layer = doc.layer(self.layer_id)?;
        if self.bounds.is_empty() {
            return None;
        }
        let before = self.before.read_rect(self.bounds);
        let after = layer.surface.read_rect(self.bounds);
        let mut change = PixelChange::new(self.layer_id);
        change.add_region(PixelRegion {
            rect: self.bounds,
            before,
            after,
        });
        if change.is_empty() {
            return None;
        }
        Some(HistoryItem::new(description, Change::Pixels(change)))
    }
}

/// What a finished stroke produced
#[derive(Debug, Clone)]
pub enum StrokeOutcome {
    /// The stroke touched mapped cells. The change may be empty, in which
    /// case it must not be pushed.
    TileMapped(TileMappedPixelChange),
    /// No mapped cell was touched (or the layer has no mapping)
    Untiled(StrokeSnapshot),
}

impl StrokeOutcome {
    /// Convert into a pushable history item, if anything changed
    pub fn into_history_item(self, doc: &Document, description: &str) -> Option<HistoryItem> {
        match self {
            Self::TileMapped(change) => {
                let item = HistoryItem::new(description, Change::TileMappedPixels(change));
                item.can_push_to_history().then_some(item)
            }
            Self::Untiled(snapshot) => snapshot.into_pixel_change(doc, description),
        }
    }
}

/// Tracks at most one active stroke
#[derive(Debug, Default)]
pub struct LiveStrokeTracker {
    active: Option<ActiveStroke>,
}

impl LiveStrokeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Layer the active stroke paints on
    pub fn layer_id(&self) -> Option<LayerId> {
        self.active.as_ref().map(|stroke| stroke.layer_id)
    }

    /// Accumulated bounds of the active stroke
    pub fn bounds(&self) -> Option<PixelRect> {
        self.active.as_ref().map(|stroke| stroke.bounds)
    }

    pub fn begin(&mut self, doc: &Document, layer_id: LayerId) -> Result<(), PaintError> {
        if self.active.is_some() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        let layer = doc.layer_or_err(layer_id)?;
        let tile_before_states = match (&layer.mapping, doc.tile_set()) {
            (Some(_), Some(tile_set)) => tile_set.snapshot(),
            _ => BTreeMap::new(),
        };
        debug!(
            "Stroke: begin on layer {} ({} tile snapshots)",
            layer_id,
            tile_before_states.len()
        );
        self.active = Some(ActiveStroke {
            layer_id,
            before_snapshot: layer.surface.clone(),
            tile_before_states,
            bounds: PixelRect::EMPTY,
        });
        Ok(())
    }

    /// Record one painted primitive and propagate its bounds to mapped tiles
    pub fn propagate_live(&mut self, doc: &mut Document, primitive: PixelRect) -> Result<PropagationReport, PaintError> {
        let stroke = self.active.as_mut().ok_or(PaintError::NoActiveStroke)?;
        let primitive = primitive.clamp_to(doc.width(), doc.height());
        stroke.bounds = stroke.bounds.union(&primitive);
        if primitive.is_empty() {
            return Ok(PropagationReport::default());
        }

        let layer_id = stroke.layer_id;
        let (layer, tile_set) = doc
            .layer_and_tiles_mut(layer_id)
            .ok_or(PaintError::LayerNotFound(layer_id))?;
        if layer.mapping.is_none() {
            return Ok(PropagationReport::default());
        }
        let mut report = propagate_region(layer, tile_set, primitive);
        let synced = sync_instances(doc, Some(layer_id), &report.updated_tiles);
        report.dirty = report.dirty.union(&synced);
        Ok(report)
    }

    /// Finish the stroke and diff it against the snapshots
    pub fn end(&mut self, doc: &Document) -> Result<StrokeOutcome, PaintError> {
        let stroke = self.active.take().ok_or(PaintError::NoActiveStroke)?;
        let layer = doc.layer_or_err(stroke.layer_id)?;

        let untiled = |stroke: ActiveStroke| {
            StrokeOutcome::Untiled(StrokeSnapshot {
                layer_id: stroke.layer_id,
                before: stroke.before_snapshot,
                bounds: stroke.bounds,
            })
        };

        let (Some(mapping), Some(tile_set)) = (layer.mapping.as_ref(), doc.tile_set()) else {
            return Ok(untiled(stroke));
        };
        let (tile_w, tile_h) = (tile_set.tile_width(), tile_set.tile_height());
        let bounds = stroke.bounds;
        if bounds.is_empty() {
            return Ok(untiled(stroke));
        }

        let min = TileCoord::new(bounds.x as u32 / tile_w, bounds.y as u32 / tile_h);
        let max = TileCoord::new(bounds.max_x() as u32 / tile_w, bounds.max_y() as u32 / tile_h);
        if mapping.ids_in_range(min, max).is_empty() {
            return Ok(untiled(stroke));
        }

        let mut change = TileMappedPixelChange::new(stroke.layer_id);

        // Free pixels: everything in the stroke bounds outside mapped cells
        let width = layer.surface.width() as usize;
        let current = layer.surface.pixels();
        let before = stroke.before_snapshot.pixels();
        for y in bounds.y..bounds.bottom() {
            for x in bounds.x..bounds.right() {
                let cell = TileCoord::new(x as u32 / tile_w, y as u32 / tile_h);
                if mapping.get(cell).is_some() {
                    continue;
                }
                let offset = (y as usize * width + x as usize) * BYTES_PER_PIXEL;
                let (old, new) = (packed_at(before, offset), packed_at(current, offset));
                if old != new {
                    change.add_non_tile_change(offset, old, new);
                }
            }
        }

        for (id, before) in &stroke.tile_before_states {
            let Some(after) = tile_set.tile_pixels(*id) else {
                continue;
            };
            if after != before.as_slice() {
                change.add_tile_delta(TileDelta {
                    tile_id: *id,
                    before: before.clone(),
                    after: after.to_vec(),
                    positions: mapping.positions_of(*id),
                });
            }
        }

        debug!(
            "Stroke: end on layer {} ({} free pixel(s), {} tile(s))",
            stroke.layer_id,
            change.non_tile.len(),
            change.tile_deltas.len()
        );
        Ok(StrokeOutcome::TileMapped(change))
    }

    /// Abandon the stroke, restoring the layer and tile definitions.
    /// Returns the area to recomposite.
    pub fn cancel(&mut self, doc: &mut Document) -> Result<PixelRect, PaintError> {
        let stroke = self.active.take().ok_or(PaintError::NoActiveStroke)?;
        let (layer, tile_set) = doc
            .layer_and_tiles_mut(stroke.layer_id)
            .ok_or(PaintError::LayerNotFound(stroke.layer_id))?;
        layer.surface = stroke.before_snapshot;

        let mut restored = Vec::new();
        if let Some(tile_set) = tile_set {
            for (id, before) in stroke.tile_before_states {
                if tile_set.tile_pixels(id).is_some_and(|current| current != before.as_slice()) {
                    tile_set.update_tile_pixels(id, before)?;
                    restored.push(id);
                }
            }
        }
        debug!(
            "Stroke: cancelled on layer {} ({} tile(s) restored)",
            stroke.layer_id,
            restored.len()
        );

        let dirty = if restored.is_empty() {
            stroke.bounds
        } else {
            doc.bounds()
        };
        sync_instances(doc, Some(stroke.layer_id), &restored);
        Ok(dirty)
    }
}
