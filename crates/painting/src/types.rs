//! Shared value types: ids, tile-grid coordinates and pixel rectangles

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A BGRA pixel value
pub type Bgra = [u8; 4];

/// Build a BGRA pixel from RGBA components
#[inline]
pub const fn bgra(r: u8, g: u8, b: u8, a: u8) -> Bgra {
    [b, g, r, a]
}

/// Pack a BGRA pixel into a little-endian u32 (byte order preserved)
#[inline]
pub fn pack_bgra(pixel: Bgra) -> u32 {
    u32::from_le_bytes(pixel)
}

/// Inverse of [`pack_bgra`]
#[inline]
pub fn unpack_bgra(packed: u32) -> Bgra {
    packed.to_le_bytes()
}

/// Identifier of a tile definition. Ids are never reused within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    /// Value written to persisted mapping grids
    pub fn to_cell(self) -> i32 {
        self.0 as i32
    }

    /// Parse a persisted mapping cell; negative values mean unmapped
    pub fn from_cell(cell: i32) -> Option<Self> {
        (cell >= 0).then_some(Self(cell as u32))
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unique identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tile-grid coordinates (column, row)
///
/// Ordered row-major: all cells of row 0 come before row 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Ord for TileCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for TileCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An integer rectangle in document pixel space.
///
/// `x`/`y` may be negative (a floating selection can be dragged off canvas);
/// `width`/`height` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub const EMPTY: PixelRect = PixelRect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0),
            height: height.max(0),
        }
    }

    /// Rectangle covering `[min_x, max_x] x [min_y, max_y]` (both ends inclusive)
    pub fn from_inclusive(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        if max_x < min_x || max_y < min_y {
            return Self::EMPTY;
        }
        Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }

    /// Rectangle covering the whole of a `width x height` surface
    pub fn of_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Inclusive maximum x
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.right() - 1
    }

    /// Inclusive maximum y
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.bottom() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of pixels covered
    #[inline]
    pub fn area(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersect(&self, other: &PixelRect) -> PixelRect {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return Self::EMPTY;
        }
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Smallest rectangle containing both; empty inputs are ignored
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Clamp to a `width x height` surface anchored at the origin
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        self.intersect(&Self::of_size(width, height))
    }

    pub fn translate(&self, dx: i32, dy: i32) -> PixelRect {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}
