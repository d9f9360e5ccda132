//! Selection lift and commit history items

use crate::document::Document;
use crate::floating::FloatingSelection;
use crate::selection::SelectionRegion;
use crate::types::{LayerId, PixelRect};

use super::deltas::{PixelRegion, TileDelta, write_region, write_tile_deltas};

/// Selected pixels cleared off a layer into a floating buffer
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionLiftChange {
    pub layer_id: LayerId,
    pub region: PixelRegion,
    pub tile_deltas: Vec<TileDelta>,
    pub selection_before: SelectionRegion,
    pub selection_after: SelectionRegion,
    /// Float restored on redo; None once the float vanished off canvas
    pub floating_after: Option<FloatingSelection>,
}

impl SelectionLiftChange {
    pub fn is_empty(&self) -> bool {
        self.region.is_noop() && self.tile_deltas.is_empty()
    }

    pub fn memory_size(&self) -> usize {
        self.region.memory_size()
            + self.tile_deltas.iter().map(TileDelta::memory_size).sum::<usize>()
            + self
                .floating_after
                .as_ref()
                .map_or(0, |floating| floating.pixels.pixels().len())
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        let dirty = write_region(doc, self.layer_id, &self.region, forward);
        let dirty = dirty.union(&write_tile_deltas(doc, self.layer_id, &self.tile_deltas, forward));
        if forward {
            doc.selection.copy_from(&self.selection_after);
            doc.floating = self.floating_after.clone();
        } else {
            doc.selection.copy_from(&self.selection_before);
            doc.floating = None;
        }
        dirty
    }
}

/// A floating selection written back onto its layer
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCommitChange {
    pub layer_id: LayerId,
    pub region: PixelRegion,
    pub tile_deltas: Vec<TileDelta>,
    /// Float as it was right before commit, restored on undo
    pub floating_before: FloatingSelection,
    pub selection_before: SelectionRegion,
    pub selection_after: SelectionRegion,
}

impl SelectionCommitChange {
    pub fn memory_size(&self) -> usize {
        self.region.memory_size()
            + self.tile_deltas.iter().map(TileDelta::memory_size).sum::<usize>()
            + self.floating_before.pixels.pixels().len()
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        let dirty = write_region(doc, self.layer_id, &self.region, forward);
        let dirty = dirty.union(&write_tile_deltas(doc, self.layer_id, &self.tile_deltas, forward));
        if forward {
            doc.selection.copy_from(&self.selection_after);
            doc.floating = None;
        } else {
            doc.selection.copy_from(&self.selection_before);
            doc.floating = Some(self.floating_before.clone());
        }
        dirty
    }
}
