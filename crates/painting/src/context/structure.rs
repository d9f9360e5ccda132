//! Structural edits (layers, canvas size) and document save/load

use tracing::info;

use crate::document::Document;
use crate::error::PaintError;
use crate::history::{CanvasState, Change, HistoryItem, StructuralChange};
use crate::persistence::DocumentFile;
use crate::types::LayerId;

use super::PaintContext;

impl PaintContext {
    /// Add an empty layer above the active one and make it active
    pub fn add_layer(&mut self, name: &str) -> Result<LayerId, PaintError> {
        self.ensure_idle()?;
        let index = self
            .document
            .layer_index(self.document.active_layer_id())
            .map_or(self.document.layer_count(), |index| index + 1);
        let layer = self.document.create_layer(name);
        let id = layer.id;
        self.push_structural("Add layer", StructuralChange::LayerAdd { index, layer });
        self.document.set_active_layer(id)?;
        Ok(id)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> Result<(), PaintError> {
        self.ensure_idle()?;
        let index = self
            .document
            .layer_index(id)
            .ok_or(PaintError::LayerNotFound(id))?;
        if self.document.layer_count() == 1 {
            return Err(PaintError::LastLayer);
        }
        let layer = self.document.layers[index].clone();
        self.push_structural("Remove layer", StructuralChange::LayerRemove { index, layer });
        Ok(())
    }

    /// Move a layer to a new stacking index (clamped)
    pub fn move_layer(&mut self, id: LayerId, to: usize) -> Result<(), PaintError> {
        self.ensure_idle()?;
        let from = self
            .document
            .layer_index(id)
            .ok_or(PaintError::LayerNotFound(id))?;
        let to = to.min(self.document.layer_count() - 1);
        if from == to {
            return Ok(());
        }
        self.push_structural(
            "Reorder layer",
            StructuralChange::LayerReorder { layer_id: id, from, to },
        );
        Ok(())
    }

    /// Resize the canvas, anchored top-left
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<(), PaintError> {
        self.ensure_idle()?;
        if (width, height) == self.document_size() {
            return Ok(());
        }
        let before = CanvasState::capture(&self.document);
        self.document.resize_canvas(width, height)?;
        let after = CanvasState::capture(&self.document);
        // Already applied above; record without re-applying
        self.history.push(HistoryItem::new(
            "Resize canvas",
            Change::Structural(StructuralChange::CanvasResize { before, after }),
        ));
        self.host.resync_derived_state(&self.document);
        self.invalidate_all();
        Ok(())
    }

    /// Apply a structural change, record it and re-sync the host
    fn push_structural(&mut self, description: &str, change: StructuralChange) {
        let item = HistoryItem::new(description, Change::Structural(change));
        item.apply(&mut self.document);
        self.history.push(item);
        self.host.resync_derived_state(&self.document);
        self.invalidate_all();
    }

    /// Serialize the document. History and floating state are not saved.
    pub fn save_json(&self) -> Result<String, PaintError> {
        if self.document.floating.is_some() {
            return Err(PaintError::FloatingSelectionActive);
        }
        DocumentFile::from_document(&self.document).to_json()
    }

    /// Replace the document with a saved one; history starts empty
    pub fn load_json(&mut self, json: &str) -> Result<(), PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        let document: Document = DocumentFile::from_json(json)?.into_document()?;
        info!(
            "Context: loaded {}x{} document with {} layer(s)",
            document.width(),
            document.height(),
            document.layer_count()
        );
        self.document = document;
        self.history.clear();
        self.pending_lift = None;
        self.host.resync_derived_state(&self.document);
        self.invalidate_all();
        Ok(())
    }
}
