//! Layer pixel access, stroke transactions, painting primitives and
//! undo/redo for the editing context

use tracing::debug;

use crate::error::PaintError;
use crate::history::{Change, HistoryItem, PixelRegion, TileAwarePixelChange};
use crate::types::{Bgra, LayerId, PixelRect};

use super::PaintContext;

impl PaintContext {
    /// Read a rectangle of layer pixels (zero-filled outside the canvas)
    pub fn read_pixels(&self, layer_id: LayerId, rect: PixelRect) -> Result<Vec<u8>, PaintError> {
        Ok(self.document.layer_or_err(layer_id)?.surface.read_rect(rect))
    }

    /// Write a rectangle of layer pixels.
    ///
    /// Not recorded on its own. Inside a transaction on the same layer the
    /// write is propagated live and captured by the transaction.
    pub fn write_pixels(&mut self, layer_id: LayerId, rect: PixelRect, data: &[u8]) -> Result<(), PaintError> {
        self.document
            .layer_mut_or_err(layer_id)?
            .surface
            .write_rect(rect, data)?;
        self.after_raw_edit(layer_id, rect)
    }

    /// Alpha-blend a rectangle of pixels onto a layer
    pub fn blend_pixels(&mut self, layer_id: LayerId, rect: PixelRect, data: &[u8], opacity: f32) -> Result<(), PaintError> {
        self.document
            .layer_mut_or_err(layer_id)?
            .surface
            .blend_rect(rect, data, opacity)?;
        self.after_raw_edit(layer_id, rect)
    }

    /// Reset a rectangle of layer pixels to transparent
    pub fn clear_pixels(&mut self, layer_id: LayerId, rect: PixelRect) -> Result<(), PaintError> {
        self.document.layer_mut_or_err(layer_id)?.surface.clear_rect(rect);
        self.after_raw_edit(layer_id, rect)
    }

    fn after_raw_edit(&mut self, layer_id: LayerId, rect: PixelRect) -> Result<(), PaintError> {
        let mut dirty = rect.clamp_to(self.document.width(), self.document.height());
        if self.stroke.layer_id() == Some(layer_id) {
            let report = self.stroke.propagate_live(&mut self.document, rect)?;
            dirty = dirty.union(&report.dirty);
        }
        self.invalidate(dirty);
        Ok(())
    }

    /// Write pixels, propagate them to mapped tiles and record one
    /// tile-aware history item. Returns whether an item was pushed.
    pub fn write_pixels_with_tile_update(
        &mut self,
        layer_id: LayerId,
        rect: PixelRect,
        data: &[u8],
        description: &str,
    ) -> Result<bool, PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        let visible = rect.clamp_to(self.document.width(), self.document.height());
        let before = self.read_pixels(layer_id, visible)?;
        let states = self.capture_tile_states(layer_id, visible);

        self.document
            .layer_mut_or_err(layer_id)?
            .surface
            .write_rect(rect, data)?;
        let dirty = self.propagate_now(layer_id, visible);

        let after = self.read_pixels(layer_id, visible)?;
        let tile_deltas = self.tile_deltas_since(layer_id, states);
        let change = TileAwarePixelChange {
            layer_id,
            region: PixelRegion {
                rect: visible,
                before,
                after,
            },
            tile_deltas,
        };
        self.invalidate(dirty);
        Ok(self
            .history
            .push(HistoryItem::new(description, Change::TileAwarePixels(change))))
    }

    /// Start batching edits on the active layer into one history item
    pub fn begin_history_transaction(&mut self) -> Result<(), PaintError> {
        if self.document.floating.is_some() {
            return Err(PaintError::FloatingSelectionActive);
        }
        let layer_id = self.document.active_layer_id();
        self.stroke.begin(&self.document, layer_id)?;
        self.host.set_pointer_capture(true);
        Ok(())
    }

    /// Finish the transaction and push its history item.
    /// Returns whether anything was recorded.
    pub fn commit_history_transaction(&mut self, description: &str) -> Result<bool, PaintError> {
        let outcome = self.stroke.end(&self.document)?;
        self.host.set_pointer_capture(false);
        let pushed = match outcome.into_history_item(&self.document, description) {
            Some(item) => self.history.push(item),
            None => false,
        };
        debug!("Context: transaction '{}' committed (pushed: {})", description, pushed);
        Ok(pushed)
    }

    /// Abandon the transaction, restoring pixels and tile definitions
    pub fn cancel_history_transaction(&mut self) -> Result<(), PaintError> {
        let dirty = self.stroke.cancel(&mut self.document)?;
        self.host.set_pointer_capture(false);
        self.invalidate(dirty);
        Ok(())
    }

    /// Alias of [`begin_history_transaction`](Self::begin_history_transaction)
    pub fn begin_stroke(&mut self) -> Result<(), PaintError> {
        self.begin_history_transaction()
    }

    /// Alias of [`commit_history_transaction`](Self::commit_history_transaction)
    pub fn end_stroke(&mut self, description: &str) -> Result<bool, PaintError> {
        self.commit_history_transaction(description)
    }

    /// Alias of [`cancel_history_transaction`](Self::cancel_history_transaction)
    pub fn cancel_stroke(&mut self) -> Result<(), PaintError> {
        self.cancel_history_transaction()
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_active()
    }

    /// Set one pixel on the stroke's layer (pencil semantics)
    pub fn paint_pixel(&mut self, x: i32, y: i32, color: Bgra) -> Result<(), PaintError> {
        self.paint_primitive(&[(x, y)], color)
    }

    /// Set every pixel on a line from `(x0, y0)` to `(x1, y1)` inclusive
    pub fn paint_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Bgra) -> Result<(), PaintError> {
        self.paint_primitive(&line_points(x0, y0, x1, y1), color)
    }

    /// Fill a rectangle on the stroke's layer
    pub fn fill_rect(&mut self, rect: PixelRect, color: Bgra) -> Result<(), PaintError> {
        let points: Vec<(i32, i32)> = (rect.y..rect.bottom())
            .flat_map(|y| (rect.x..rect.right()).map(move |x| (x, y)))
            .collect();
        self.paint_primitive(&points, color)
    }

    /// Write one primitive, masked by the selection, and propagate it once
    fn paint_primitive(&mut self, points: &[(i32, i32)], color: Bgra) -> Result<(), PaintError> {
        let layer_id = self.stroke.layer_id().ok_or(PaintError::NoActiveStroke)?;
        let selection = &self.document.selection;
        let masked = !selection.is_empty();

        let mut bounds = PixelRect::EMPTY;
        let mut written = Vec::with_capacity(points.len());
        for &(x, y) in points {
            if masked && !selection.contains(x, y) {
                continue;
            }
            written.push((x, y));
            bounds = bounds.union(&PixelRect::new(x, y, 1, 1));
        }

        let layer = self.document.layer_mut_or_err(layer_id)?;
        for (x, y) in written {
            layer.surface.set_pixel(x, y, color);
        }
        if bounds.is_empty() {
            return Ok(());
        }

        let report = self.stroke.propagate_live(&mut self.document, bounds)?;
        let dirty = bounds
            .clamp_to(self.document.width(), self.document.height())
            .union(&report.dirty);
        self.invalidate(dirty);
        Ok(())
    }

    /// Undo one step. While a freshly lifted selection floats, undo discards
    /// the float (including anything painted into it) and restores the
    /// lifted pixels instead. Returns whether anything changed.
    pub fn undo(&mut self) -> Result<bool, PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        if self.document.floating.is_some() && self.discard_floating() {
            return Ok(true);
        }
        let Some(step) = self.history.undo(&mut self.document) else {
            return Ok(false);
        };
        self.finish_traversal(step.dirty, step.structural);
        Ok(true)
    }

    /// Redo one step. Returns whether anything changed.
    pub fn redo(&mut self) -> Result<bool, PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        if self.pending_lift.is_some() {
            return Err(PaintError::FloatingSelectionActive);
        }
        let Some(step) = self.history.redo(&mut self.document) else {
            return Ok(false);
        };
        self.finish_traversal(step.dirty, step.structural);
        Ok(true)
    }

    /// Undo or redo until `target` items are applied. Returns the step count.
    pub fn jump_to(&mut self, target: usize) -> Result<usize, PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        if self.pending_lift.is_some() {
            return Err(PaintError::FloatingSelectionActive);
        }
        let steps = self.history.jump_to(&mut self.document, target);
        let structural = steps.iter().any(|step| step.structural);
        let dirty = steps
            .iter()
            .fold(PixelRect::EMPTY, |dirty, step| dirty.union(&step.dirty));
        self.finish_traversal(dirty, structural);
        Ok(steps.len())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.pending_lift.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo() && self.pending_lift.is_none()
    }

    fn finish_traversal(&mut self, dirty: PixelRect, structural: bool) {
        if structural {
            self.host.resync_derived_state(&self.document);
            self.invalidate_all();
        } else {
            self.invalidate(dirty);
        }
    }
}

/// Bresenham line, endpoints included
fn line_points(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    let mut points = Vec::with_capacity((dx - dy + 1) as usize);
    loop {
        points.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::line_points;

    #[test]
    fn test_line_points() {
        assert_eq!(line_points(0, 0, 3, 0), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(line_points(0, 0, 2, 2), vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(line_points(1, 1, 1, 1), vec![(1, 1)]);
        assert_eq!(line_points(2, 0, 0, 1).len(), 3);
    }
}
