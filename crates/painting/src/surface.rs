//! CPU pixel surface - 8-bit BGRA storage shared by layers, tiles and floats

use std::fmt;

use crate::constants::{BYTES_PER_PIXEL, TRANSPARENT};
use crate::error::PaintError;
use crate::types::{Bgra, PixelRect};

/// A fixed-size BGRA surface
/// Pixels are stored row-major with no padding, 4 bytes each.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    /// Invariant: `pixels.len() == width * height * 4`
    pixels: Vec<u8>,
}

impl fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Byte length of a `width x height` BGRA buffer
#[inline]
pub fn buffer_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Copy `rect` out of a raw `width x height` BGRA buffer.
/// Parts of `rect` outside the buffer read as transparent.
pub fn copy_rect_from(buffer: &[u8], width: u32, height: u32, rect: PixelRect) -> Vec<u8> {
    let mut out = vec![0u8; rect.area() * BYTES_PER_PIXEL];
    let visible = rect.clamp_to(width, height);
    if visible.is_empty() {
        return out;
    }

    let row_bytes = visible.width as usize * BYTES_PER_PIXEL;
    for y in visible.y..visible.bottom() {
        let src = (y as usize * width as usize + visible.x as usize) * BYTES_PER_PIXEL;
        let dst = ((y - rect.y) as usize * rect.width as usize + (visible.x - rect.x) as usize)
            * BYTES_PER_PIXEL;
        out[dst..dst + row_bytes].copy_from_slice(&buffer[src..src + row_bytes]);
    }
    out
}

/// Standard straight-alpha "over" compositing of `src` onto `dst`.
///
/// A fully transparent destination takes the source color verbatim so that
/// moving pixels onto cleared areas round-trips exactly.
pub fn blend_over(dst: Bgra, src: Bgra, opacity: f32) -> Bgra {
    let src_alpha = (src[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    if src_alpha <= 0.0 {
        return dst;
    }
    if dst[3] == 0 || src_alpha >= 1.0 {
        return [src[0], src[1], src[2], (src_alpha * 255.0).round() as u8];
    }

    let dst_alpha = dst[3] as f32 / 255.0;
    let inv_src_alpha = 1.0 - src_alpha;
    let out_alpha = src_alpha + dst_alpha * inv_src_alpha;

    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src[c] as f32 * src_alpha + dst[c] as f32 * dst_alpha * inv_src_alpha) / out_alpha;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_alpha * 255.0).round() as u8;
    out
}

impl PixelSurface {
    /// Create a new surface with the given dimensions, initialized to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; buffer_len(width, height)],
        }
    }

    /// Wrap an existing BGRA buffer; its length must match the dimensions
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PaintError> {
        let expected = buffer_len(width, height);
        if pixels.len() != expected {
            return Err(PaintError::PixelBufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Rectangle covering the whole surface
    #[inline]
    pub fn bounds(&self) -> PixelRect {
        PixelRect::of_size(self.width, self.height)
    }

    /// Byte offset of a pixel, or None if out of bounds
    #[inline]
    pub fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Bgra> {
        let offset = self.byte_offset(x, y)?;
        let mut pixel = [0u8; 4];
        pixel.copy_from_slice(&self.pixels[offset..offset + BYTES_PER_PIXEL]);
        Some(pixel)
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Bgra) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.pixels[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color);
        }
    }

    /// Blend a color onto an existing pixel using alpha compositing
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Bgra, opacity: f32) {
        if let Some(dst) = self.get_pixel(x, y) {
            self.set_pixel(x, y, blend_over(dst, color, opacity));
        }
    }

    /// Clear the surface to a solid color
    pub fn clear(&mut self, color: Bgra) {
        for pixel in self.as_pixels_mut() {
            *pixel = color;
        }
    }

    /// Read a rectangle of pixels (row-major BGRA).
    /// Parts outside the surface read as transparent.
    pub fn read_rect(&self, rect: PixelRect) -> Vec<u8> {
        copy_rect_from(&self.pixels, self.width, self.height, rect)
    }

    /// Write a rectangle of pixels; `data` must cover all of `rect`.
    /// Parts of `rect` outside the surface are skipped.
    pub fn write_rect(&mut self, rect: PixelRect, data: &[u8]) -> Result<(), PaintError> {
        Self::check_rect_len(rect, data)?;
        let visible = rect.clamp_to(self.width, self.height);
        if visible.is_empty() {
            return Ok(());
        }

        let row_bytes = visible.width as usize * BYTES_PER_PIXEL;
        for y in visible.y..visible.bottom() {
            let src = ((y - rect.y) as usize * rect.width as usize + (visible.x - rect.x) as usize)
                * BYTES_PER_PIXEL;
            let dst = (y as usize * self.width as usize + visible.x as usize) * BYTES_PER_PIXEL;
            self.pixels[dst..dst + row_bytes].copy_from_slice(&data[src..src + row_bytes]);
        }
        Ok(())
    }

    /// Alpha-blend a rectangle of pixels onto the surface
    pub fn blend_rect(&mut self, rect: PixelRect, data: &[u8], opacity: f32) -> Result<(), PaintError> {
        Self::check_rect_len(rect, data)?;
        let visible = rect.clamp_to(self.width, self.height);
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                let src = ((y - rect.y) as usize * rect.width as usize + (x - rect.x) as usize)
                    * BYTES_PER_PIXEL;
                let mut color = [0u8; 4];
                color.copy_from_slice(&data[src..src + BYTES_PER_PIXEL]);
                self.blend_pixel(x, y, color, opacity);
            }
        }
        Ok(())
    }

    /// Fill a rectangle (clamped) with a solid color
    pub fn fill_rect(&mut self, rect: PixelRect, color: Bgra) {
        let visible = rect.clamp_to(self.width, self.height);
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                self.set_pixel(x, y, color);
            }
        }
    }

    /// Reset a rectangle (clamped) to transparent
    pub fn clear_rect(&mut self, rect: PixelRect) {
        self.fill_rect(rect, TRANSPARENT);
    }

    /// Copy of this surface cropped/extended to a new size, anchored top-left
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let pixels = self.read_rect(PixelRect::of_size(width, height));
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Raw BGRA bytes
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable raw BGRA bytes (length is fixed)
    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// View the buffer as one `[b, g, r, a]` entry per pixel
    #[inline]
    pub fn as_pixels(&self) -> &[Bgra] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    pub fn as_pixels_mut(&mut self) -> &mut [Bgra] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    fn check_rect_len(rect: PixelRect, data: &[u8]) -> Result<(), PaintError> {
        let expected = rect.area() * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(PaintError::PixelBufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }
}
