//! Structural history items: canvas resize and layer topology.
//!
//! Traversing one of these only restores document topology. Hosts must
//! re-sync derived state (zoom, composite buffers, overlays) afterwards.

use tracing::{info, warn};

use crate::document::Document;
use crate::layer::RasterLayer;
use crate::selection::SelectionRegion;
use crate::types::{LayerId, PixelRect};

/// Everything a canvas resize changes
#[derive(Debug, Clone)]
pub struct CanvasState {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<RasterLayer>,
    pub selection: SelectionRegion,
}

impl CanvasState {
    pub fn capture(doc: &Document) -> Self {
        Self {
            width: doc.width,
            height: doc.height,
            layers: doc.layers.clone(),
            selection: doc.selection.clone(),
        }
    }

    fn restore(&self, doc: &mut Document) {
        doc.width = self.width;
        doc.height = self.height;
        doc.layers = self.layers.clone();
        doc.selection.copy_from(&self.selection);
        if doc.layer(doc.active_layer).is_none() {
            doc.active_layer = doc.layers.first().map_or(doc.active_layer, |layer| layer.id);
        }
    }

    fn memory_size(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.surface.pixels().len())
            .sum()
    }
}

#[derive(Debug, Clone)]
pub enum StructuralChange {
    CanvasResize { before: CanvasState, after: CanvasState },
    LayerAdd { index: usize, layer: RasterLayer },
    LayerRemove { index: usize, layer: RasterLayer },
    LayerReorder { layer_id: LayerId, from: usize, to: usize },
}

impl StructuralChange {
    pub fn memory_size(&self) -> usize {
        match self {
            Self::CanvasResize { before, after } => before.memory_size() + after.memory_size(),
            Self::LayerAdd { layer, .. } | Self::LayerRemove { layer, .. } => layer.surface.pixels().len(),
            Self::LayerReorder { .. } => 0,
        }
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        match (self, forward) {
            (Self::CanvasResize { after, .. }, true) => after.restore(doc),
            (Self::CanvasResize { before, .. }, false) => before.restore(doc),
            (Self::LayerAdd { index, layer }, true) | (Self::LayerRemove { index, layer }, false) => {
                doc.insert_layer(*index, layer.clone());
            }
            (Self::LayerAdd { layer, .. }, false) | (Self::LayerRemove { layer, .. }, true) => {
                if let Err(err) = doc.remove_layer(layer.id) {
                    warn!("History: could not remove layer {}: {}", layer.id, err);
                }
            }
            (Self::LayerReorder { layer_id, from, to }, forward) => {
                let target = if forward { *to } else { *from };
                if let Err(err) = doc.move_layer(*layer_id, target) {
                    warn!("History: could not move layer {}: {}", layer_id, err);
                }
            }
        }
        info!("History: structural change traversed (forward: {})", forward);
        doc.bounds()
    }
}
