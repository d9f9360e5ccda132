//! Editing context consumed by tools
//!
//! `PaintContext` ties together:
//! - the [`Document`] (layers, tile set, selection)
//! - the [`HistoryStack`]
//! - the [`LiveStrokeTracker`] for the gesture in progress
//! - a [`CanvasHost`] that is told when to redraw and re-sync
//!
//! Tools talk to this type only; they never reach into engine internals.

mod painting;
mod selection;
mod structure;
mod tiles;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use pixtile_config::EditorConfig;
use tracing::debug;

use crate::document::Document;
use crate::error::PaintError;
use crate::floating::{FloatingTransform, NearestNeighborTransform};
use crate::history::{HistoryStack, SelectionLiftChange, TileDelta};
use crate::propagation::{propagate_region, sync_instances};
use crate::stroke::LiveStrokeTracker;
use crate::types::{LayerId, PixelRect, TileCoord, TileId};

/// Presentation hooks. Every method defaults to a no-op.
pub trait CanvasHost: Send {
    /// Recomposite and redraw; `None` means the whole canvas
    fn invalidate(&mut self, _dirty: Option<PixelRect>) {}

    /// Capture or release the pointer around a stroke
    fn set_pointer_capture(&mut self, _captured: bool) {}

    /// Rebuild zoom, overlay and composite caches after a structural change
    fn resync_derived_state(&mut self, _document: &Document) {}
}

/// Host that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl CanvasHost for NullHost {}

/// The painting core's consumer interface
pub struct PaintContext {
    pub(crate) document: Document,
    pub(crate) history: HistoryStack,
    pub(crate) stroke: LiveStrokeTracker,
    pub(crate) host: Box<dyn CanvasHost>,
    pub(crate) transform: Box<dyn FloatingTransform>,
    /// Lift recorded when the float was created, pushed at commit
    pub(crate) pending_lift: Option<SelectionLiftChange>,
}

impl std::fmt::Debug for PaintContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintContext")
            .field("document", &self.document)
            .field("history", &self.history)
            .field("stroke", &self.stroke)
            .field("pending_lift", &self.pending_lift.is_some())
            .finish_non_exhaustive()
    }
}

impl PaintContext {
    /// Wrap a document with an unlimited history
    pub fn new(document: Document) -> Self {
        Self {
            document,
            history: HistoryStack::new(),
            stroke: LiveStrokeTracker::new(),
            host: Box::new(NullHost),
            transform: Box::new(NearestNeighborTransform),
            pending_lift: None,
        }
    }

    /// Build a new document and history from editor settings
    pub fn from_config(config: &EditorConfig) -> Result<Self, PaintError> {
        let document = Document::from_config(config)?;
        let mut context = Self::new(document);
        context.history = HistoryStack::with_limit(config.history.limit());
        Ok(context)
    }

    pub fn with_host(mut self, host: impl CanvasHost + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn with_transform(mut self, transform: impl FloatingTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history = HistoryStack::with_limit(limit);
        self
    }

    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn document_size(&self) -> (u32, u32) {
        (self.document.width(), self.document.height())
    }

    pub fn tile_size(&self) -> Option<(u32, u32)> {
        self.document.tile_size()
    }

    pub fn tile_grid_size(&self) -> Option<(u32, u32)> {
        self.document.tile_grid_size()
    }

    pub fn doc_to_tile(&self, x: i32, y: i32) -> Option<TileCoord> {
        self.document.doc_to_tile(x, y)
    }

    pub fn tile_rect(&self, coord: TileCoord) -> Option<PixelRect> {
        self.document.tile_rect(coord)
    }

    pub fn active_layer_id(&self) -> LayerId {
        self.document.active_layer_id()
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> Result<(), PaintError> {
        self.document.set_active_layer(id)
    }

    /// Fails while a stroke is in progress or a selection floats
    pub(crate) fn ensure_idle(&self) -> Result<(), PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        if self.document.floating.is_some() {
            return Err(PaintError::FloatingSelectionActive);
        }
        Ok(())
    }

    pub(crate) fn invalidate(&mut self, dirty: PixelRect) {
        if !dirty.is_empty() {
            self.host.invalidate(Some(dirty));
        }
    }

    pub(crate) fn invalidate_all(&mut self) {
        self.host.invalidate(None);
    }

    /// Canonical pixels of every tile mapped in `rect` on a layer
    pub(crate) fn capture_tile_states(&self, layer_id: LayerId, rect: PixelRect) -> BTreeMap<TileId, Vec<u8>> {
        let mut states = BTreeMap::new();
        let (Some(layer), Some(tile_set)) = (self.document.layer(layer_id), self.document.tile_set()) else {
            return states;
        };
        let Some(mapping) = layer.mapping.as_ref() else {
            return states;
        };
        let rect = rect.clamp_to(self.document.width(), self.document.height());
        if rect.is_empty() {
            return states;
        }
        let (tile_w, tile_h) = (tile_set.tile_width(), tile_set.tile_height());
        let min = TileCoord::new(rect.x as u32 / tile_w, rect.y as u32 / tile_h);
        let max = TileCoord::new(rect.max_x() as u32 / tile_w, rect.max_y() as u32 / tile_h);
        for id in mapping.ids_in_range(min, max) {
            if let Some(pixels) = tile_set.tile_pixels(id) {
                states.insert(id, pixels.to_vec());
            }
        }
        states
    }

    /// Tile deltas for every captured tile whose definition changed since
    pub(crate) fn tile_deltas_since(&self, layer_id: LayerId, states: BTreeMap<TileId, Vec<u8>>) -> Vec<TileDelta> {
        let (Some(layer), Some(tile_set)) = (self.document.layer(layer_id), self.document.tile_set()) else {
            return Vec::new();
        };
        let Some(mapping) = layer.mapping.as_ref() else {
            return Vec::new();
        };
        states
            .into_iter()
            .filter_map(|(tile_id, before)| {
                let after = tile_set.tile_pixels(tile_id)?;
                (after != before.as_slice()).then(|| TileDelta {
                    tile_id,
                    before,
                    after: after.to_vec(),
                    positions: mapping.positions_of(tile_id),
                })
            })
            .collect()
    }

    /// Propagate an edited rect of a layer outside of a stroke and sync
    /// other layers. Returns the area to recomposite.
    pub(crate) fn propagate_now(&mut self, layer_id: LayerId, rect: PixelRect) -> PixelRect {
        let Some((layer, tile_set)) = self.document.layer_and_tiles_mut(layer_id) else {
            return PixelRect::EMPTY;
        };
        let report = propagate_region(layer, tile_set, rect);
        let synced = sync_instances(&mut self.document, Some(layer_id), &report.updated_tiles);
        debug!("Context: propagated {} tile(s)", report.updated_tiles.len());
        let edited = rect.clamp_to(self.document.width(), self.document.height());
        report.dirty.union(&synced).union(&edited)
    }
}
