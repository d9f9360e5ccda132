//! Selection editing and the lift / transform / commit cycle of floating
//! selections

use glam::{IVec2, Vec2};
use tracing::debug;

use crate::error::PaintError;
use crate::floating::FloatingSelection;
use crate::history::{Change, HistoryItem, PixelRegion, SelectionCommitChange, SelectionLiftChange};
use crate::selection::SelectionRegion;
use crate::surface::PixelSurface;
use crate::types::{Bgra, PixelRect};

use super::PaintContext;

impl PaintContext {
    pub fn selection(&self) -> &SelectionRegion {
        &self.document.selection
    }

    pub fn floating(&self) -> Option<&FloatingSelection> {
        self.document.floating.as_ref()
    }

    /// Replace the selection with a rectangle (clipped to the canvas)
    pub fn select_rect(&mut self, rect: PixelRect) -> Result<(), PaintError> {
        self.ensure_idle()?;
        self.document.selection.clear();
        self.add_to_selection(rect)
    }

    pub fn add_to_selection(&mut self, rect: PixelRect) -> Result<(), PaintError> {
        self.ensure_idle()?;
        let rect = rect.clamp_to(self.document.width(), self.document.height());
        self.document.selection.add_rect(rect);
        self.invalidate(rect);
        Ok(())
    }

    pub fn subtract_from_selection(&mut self, rect: PixelRect) -> Result<(), PaintError> {
        self.ensure_idle()?;
        self.document.selection.subtract_rect(rect);
        self.invalidate(rect.clamp_to(self.document.width(), self.document.height()));
        Ok(())
    }

    /// Replace the selection with an arbitrary region (clipped to the canvas)
    pub fn set_selection(&mut self, region: SelectionRegion) -> Result<(), PaintError> {
        self.ensure_idle()?;
        let dirty = self.document.selection.bounds().union(&region.bounds());
        self.document.selection = region;
        self.document
            .selection
            .clip_to(self.document.width(), self.document.height());
        self.invalidate(dirty.clamp_to(self.document.width(), self.document.height()));
        Ok(())
    }

    pub fn clear_selection(&mut self) -> Result<(), PaintError> {
        self.ensure_idle()?;
        let dirty = self.document.selection.bounds();
        self.document.selection.clear();
        self.invalidate(dirty);
        Ok(())
    }

    /// Cut the selected pixels of the active layer into a floating buffer.
    ///
    /// The cleared area is propagated to mapped tiles so every instance of
    /// an affected tile loses the lifted content. The lift is recorded at
    /// commit time.
    pub fn lift_selection(&mut self) -> Result<(), PaintError> {
        self.ensure_idle()?;
        let mut region = self.document.selection.clone();
        region.clip_to(self.document.width(), self.document.height());
        if region.is_empty() {
            return Err(PaintError::EmptySelection);
        }

        let layer_id = self.document.active_layer_id();
        let rect = region.bounds();
        let before = self.read_pixels(layer_id, rect)?;
        let states = self.capture_tile_states(layer_id, rect);

        // Float keeps only the selected pixels, in local coordinates
        let mut mask = region.clone();
        mask.translate(-rect.x, -rect.y);
        let source = PixelSurface::from_pixels(rect.width as u32, rect.height as u32, before.clone())?;
        let mut pixels = PixelSurface::new(rect.width as u32, rect.height as u32);
        for (x, y) in mask.pixels() {
            if let Some(color) = source.get_pixel(x, y) {
                pixels.set_pixel(x, y, color);
            }
        }

        let layer = self.document.layer_mut_or_err(layer_id)?;
        for (y, span) in region.spans() {
            layer
                .surface
                .clear_rect(PixelRect::new(span.start, y, span.end - span.start, 1));
        }
        let dirty = self.propagate_now(layer_id, rect);

        let after = self.read_pixels(layer_id, rect)?;
        let tile_deltas = self.tile_deltas_since(layer_id, states);
        let floating = FloatingSelection::new(layer_id, rect, pixels, mask);

        self.pending_lift = Some(SelectionLiftChange {
            layer_id,
            region: PixelRegion { rect, before, after },
            tile_deltas,
            selection_before: self.document.selection.clone(),
            selection_after: region.clone(),
            floating_after: Some(floating.clone()),
        });
        self.document.selection = region;
        self.document.floating = Some(floating);
        debug!("Context: lifted {} pixel(s) from layer {}", self.document.selection.pixel_count(), layer_id);
        self.invalidate(dirty);
        Ok(())
    }

    /// Move the floating selection by an offset
    pub fn move_floating(&mut self, dx: i32, dy: i32) -> Result<(), PaintError> {
        let floating = self
            .document
            .floating
            .as_mut()
            .ok_or(PaintError::NoFloatingSelection)?;
        floating.origin += IVec2::new(dx, dy);
        self.refresh_floating_selection();
        Ok(())
    }

    /// Set the floating selection's scale; zero or negative scales make the
    /// float vanish on commit
    pub fn set_floating_scale(&mut self, scale: Vec2) -> Result<(), PaintError> {
        let floating = self
            .document
            .floating
            .as_mut()
            .ok_or(PaintError::NoFloatingSelection)?;
        floating.scale = scale;
        self.refresh_floating_selection();
        Ok(())
    }

    /// Paint into the floating buffer at local coordinates
    pub fn paint_floating_pixel(&mut self, x: i32, y: i32, color: Bgra) -> Result<(), PaintError> {
        let floating = self
            .document
            .floating
            .as_mut()
            .ok_or(PaintError::NoFloatingSelection)?;
        if floating.pixels.byte_offset(x, y).is_none() {
            return Ok(());
        }
        floating.pixels.set_pixel(x, y, color);
        floating.mask.add_rect(PixelRect::new(x, y, 1, 1));
        floating.painted = true;
        self.refresh_floating_selection();
        Ok(())
    }

    /// Selection follows the transformed float
    fn refresh_floating_selection(&mut self) {
        let Some(floating) = self.document.floating.as_ref() else {
            return;
        };
        let previous = self.document.selection.bounds();
        let mut region = self.transform.transform(floating).region;
        region.clip_to(self.document.width(), self.document.height());
        let dirty = previous.union(&region.bounds());
        self.document.selection = region;
        self.invalidate(dirty);
    }

    /// Blit the transformed float back onto its layer.
    ///
    /// Pushes the pending lift and a commit item. If the float vanished
    /// (scaled to nothing or moved fully off canvas), nothing is written,
    /// only the lift is pushed and the selection is cleared.
    /// Returns whether the float landed on the canvas.
    pub fn commit_floating(&mut self) -> Result<bool, PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        let floating = self
            .document
            .floating
            .take()
            .ok_or(PaintError::NoFloatingSelection)?;
        let layer_id = floating.layer_id;
        let transformed = self.transform.transform(&floating);
        let mut region = transformed.region.clone();
        region.clip_to(self.document.width(), self.document.height());

        if region.is_empty() {
            if let Some(mut lift) = self.pending_lift.take() {
                lift.selection_after = SelectionRegion::new();
                lift.floating_after = None;
                self.history
                    .push(HistoryItem::new("Lift selection", Change::SelectionLift(lift)));
            }
            let dirty = self.document.selection.bounds();
            self.document.selection.clear();
            debug!("Context: floating selection vanished off canvas");
            self.invalidate(dirty);
            return Ok(false);
        }

        let rect = region.bounds();
        let before = self.read_pixels(layer_id, rect)?;
        let states = self.capture_tile_states(layer_id, rect);

        // Blit: selected pixels replace the destination, alpha included
        let origin = transformed.origin;
        let layer = self.document.layer_mut_or_err(layer_id)?;
        for (x, y) in region.pixels() {
            if let Some(color) = transformed.pixels.get_pixel(x - origin.x, y - origin.y) {
                layer.surface.set_pixel(x, y, color);
            }
        }
        let dirty = self.propagate_now(layer_id, rect);

        let after = self.read_pixels(layer_id, rect)?;
        let tile_deltas = self.tile_deltas_since(layer_id, states);

        if let Some(lift) = self.pending_lift.take() {
            self.history
                .push(HistoryItem::new("Lift selection", Change::SelectionLift(lift)));
        }
        let commit = SelectionCommitChange {
            layer_id,
            region: PixelRegion { rect, before, after },
            tile_deltas,
            floating_before: floating,
            selection_before: self.document.selection.clone(),
            selection_after: region.clone(),
        };
        self.history
            .push(HistoryItem::new("Commit selection", Change::SelectionCommit(commit)));
        self.document.selection = region;
        debug!("Context: committed floating selection at {:?}", rect);
        self.invalidate(dirty);
        Ok(true)
    }

    /// Drop the floating selection.
    ///
    /// An unpainted float is put back exactly as it was before the lift and
    /// nothing is recorded. A painted float is committed at its lift position.
    /// A float restored by undo is reverted by undoing its lift.
    pub fn cancel_floating(&mut self) -> Result<(), PaintError> {
        if self.stroke.is_active() {
            return Err(PaintError::StrokeAlreadyActive);
        }
        let floating = self
            .document
            .floating
            .as_mut()
            .ok_or(PaintError::NoFloatingSelection)?;

        if floating.painted {
            floating.origin = IVec2::new(floating.source_rect.x, floating.source_rect.y);
            floating.scale = Vec2::ONE;
            self.commit_floating()?;
            return Ok(());
        }

        if self.discard_floating() {
            return Ok(());
        }
        let lift_on_top = matches!(
            self.history.peek_undo().map(HistoryItem::change),
            Some(Change::SelectionLift(_))
        );
        if lift_on_top {
            if let Some(step) = self.history.undo(&mut self.document) {
                self.invalidate(step.dirty);
            }
        } else {
            self.commit_floating()?;
        }
        Ok(())
    }

    /// Drop a freshly lifted float, painted or not, and put the layer and
    /// tiles back as they were before the lift. Nothing is recorded.
    /// Returns false if there was no pending lift.
    pub(crate) fn discard_floating(&mut self) -> bool {
        let Some(lift) = self.pending_lift.take() else {
            return false;
        };
        let item = HistoryItem::new("Lift selection", Change::SelectionLift(lift));
        let dirty = item.unapply(&mut self.document);
        debug!("Context: floating selection discarded");
        self.invalidate(dirty);
        true
    }
}
