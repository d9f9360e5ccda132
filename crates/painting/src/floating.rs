//! Floating selections and the geometry transform applied before commit

use glam::{IVec2, Vec2};

use crate::surface::PixelSurface;
use crate::selection::SelectionRegion;
use crate::types::{LayerId, PixelRect};

/// Pixels lifted off a layer, pending transform and commit.
///
/// `pixels` and `mask` are in local coordinates: local (0, 0) sits at
/// `origin` in document space once scale is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingSelection {
    pub layer_id: LayerId,
    /// Document rectangle the pixels were lifted from
    pub source_rect: PixelRect,
    /// Current document position of local (0, 0)
    pub origin: IVec2,
    pub scale: Vec2,
    pub pixels: PixelSurface,
    pub mask: SelectionRegion,
    /// Set once anything was painted into the floating buffer
    pub painted: bool,
}

impl FloatingSelection {
    pub fn new(layer_id: LayerId, source_rect: PixelRect, pixels: PixelSurface, mask: SelectionRegion) -> Self {
        Self {
            layer_id,
            source_rect,
            origin: IVec2::new(source_rect.x, source_rect.y),
            scale: Vec2::ONE,
            pixels,
            mask,
            painted: false,
        }
    }

    /// True if the float still sits where it was lifted, unscaled
    pub fn is_untransformed(&self) -> bool {
        self.origin == IVec2::new(self.source_rect.x, self.source_rect.y) && self.scale == Vec2::ONE
    }

    /// Offset from the lift position
    pub fn offset(&self) -> IVec2 {
        self.origin - IVec2::new(self.source_rect.x, self.source_rect.y)
    }
}

/// Result of transforming a float: pixels placed at `origin`, with a
/// document-space mask of the pixels that belong to the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedFloat {
    pub origin: IVec2,
    pub pixels: PixelSurface,
    pub region: SelectionRegion,
}

impl TransformedFloat {
    /// Document rectangle covered by the transformed pixels
    pub fn rect(&self) -> PixelRect {
        PixelRect::new(
            self.origin.x,
            self.origin.y,
            self.pixels.width() as i32,
            self.pixels.height() as i32,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }
}

/// Geometry transform applied to a floating selection at commit time
pub trait FloatingTransform: Send + Sync {
    fn transform(&self, floating: &FloatingSelection) -> TransformedFloat;
}

/// Translate plus axis-aligned nearest-neighbour scaling.
/// A scale of zero or less on either axis yields an empty result.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestNeighborTransform;

impl FloatingTransform for NearestNeighborTransform {
    fn transform(&self, floating: &FloatingSelection) -> TransformedFloat {
        let empty = TransformedFloat {
            origin: floating.origin,
            pixels: PixelSurface::new(0, 0),
            region: SelectionRegion::new(),
        };

        let scale = floating.scale;
        if !(scale.x > 0.0 && scale.y > 0.0) {
            return empty;
        }

        if scale == Vec2::ONE {
            let mut region = floating.mask.clone();
            region.translate(floating.origin.x, floating.origin.y);
            return TransformedFloat {
                origin: floating.origin,
                pixels: floating.pixels.clone(),
                region,
            };
        }

        let src_w = floating.pixels.width();
        let src_h = floating.pixels.height();
        let dst_w = (src_w as f32 * scale.x).round() as u32;
        let dst_h = (src_h as f32 * scale.y).round() as u32;
        if dst_w == 0 || dst_h == 0 {
            return empty;
        }

        let mut pixels = PixelSurface::new(dst_w, dst_h);
        let mut region = SelectionRegion::new();
        for dy in 0..dst_h {
            let sy = (((dy as f32 + 0.5) / scale.y) as u32).min(src_h - 1) as i32;
            let mut run_start: Option<i32> = None;
            for dx in 0..dst_w {
                let sx = (((dx as f32 + 0.5) / scale.x) as u32).min(src_w - 1) as i32;
                let selected = floating.mask.contains(sx, sy);
                if selected {
                    if let Some(color) = floating.pixels.get_pixel(sx, sy) {
                        pixels.set_pixel(dx as i32, dy as i32, color);
                    }
                    run_start.get_or_insert(dx as i32);
                } else if let Some(start) = run_start.take() {
                    region.add_rect(PixelRect::new(start, dy as i32, dx as i32 - start, 1));
                }
            }
            if let Some(start) = run_start {
                region.add_rect(PixelRect::new(start, dy as i32, dst_w as i32 - start, 1));
            }
        }
        region.translate(floating.origin.x, floating.origin.y);

        TransformedFloat {
            origin: floating.origin,
            pixels,
            region,
        }
    }
}
