//! Per-layer tile grid: each cell references a tile id or nothing

use std::collections::BTreeSet;

use crate::constants::UNMAPPED_CELL;
use crate::error::PaintError;
use crate::types::{TileCoord, TileId};

/// A `width x height` grid of optional tile ids, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileMapping {
    width: u32,
    height: u32,
    cells: Vec<Option<TileId>>,
}

impl TileMapping {
    /// Create an unmapped grid
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    /// Grid sized to cover a document: `ceil(doc / tile)` in each axis
    pub fn for_document(doc_width: u32, doc_height: u32, tile_width: u32, tile_height: u32) -> Self {
        Self::new(
            doc_width.div_ceil(tile_width.max(1)),
            doc_height.div_ceil(tile_height.max(1)),
        )
    }

    /// Rebuild from a persisted dense grid (`-1` = unmapped)
    pub fn from_dense(width: u32, height: u32, cells: &[i32]) -> Result<Self, PaintError> {
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(PaintError::Corrupt(format!(
                "mapping grid has {} cells, expected {}",
                cells.len(),
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            cells: cells.iter().map(|&cell| TileId::from_cell(cell)).collect(),
        })
    }

    /// Dense grid for persistence, `-1` for unmapped cells
    pub fn to_dense(&self) -> Vec<i32> {
        self.cells
            .iter()
            .map(|cell| cell.map_or(UNMAPPED_CELL, TileId::to_cell))
            .collect()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }

    /// Tile id at a cell; None if unmapped or out of the grid
    pub fn get(&self, coord: TileCoord) -> Option<TileId> {
        self.index(coord).and_then(|index| self.cells[index])
    }

    /// Assign a cell and return its previous value. Out-of-grid cells are ignored.
    pub fn set(&mut self, coord: TileCoord, id: Option<TileId>) -> Option<TileId> {
        let index = self.index(coord)?;
        std::mem::replace(&mut self.cells[index], id)
    }

    /// Unmap a cell, returning what it referenced
    pub fn clear(&mut self, coord: TileCoord) -> Option<TileId> {
        self.set(coord, None)
    }

    pub fn clear_all(&mut self) {
        self.cells.fill(None);
    }

    /// True if no cell references a tile
    pub fn is_unmapped(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Every mapped cell with its id, in ascending row-major order
    pub fn mapped_cells(&self) -> impl Iterator<Item = (TileCoord, TileId)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            cell.map(|id| {
                let index = index as u32;
                (TileCoord::new(index % width, index / width), id)
            })
        })
    }

    /// Every cell referencing `id`, in ascending row-major order
    pub fn positions_of(&self, id: TileId) -> Vec<TileCoord> {
        self.mapped_cells()
            .filter(|(_, cell)| *cell == id)
            .map(|(coord, _)| coord)
            .collect()
    }

    /// Distinct tile ids within the inclusive cell range, ascending.
    /// The range is clamped to the grid.
    pub fn ids_in_range(&self, min: TileCoord, max: TileCoord) -> BTreeSet<TileId> {
        let mut ids = BTreeSet::new();
        if self.width == 0 || self.height == 0 {
            return ids;
        }
        let max_x = max.x.min(self.width - 1);
        let max_y = max.y.min(self.height - 1);
        for y in min.y..=max_y {
            for x in min.x..=max_x {
                if let Some(id) = self.get(TileCoord::new(x, y)) {
                    ids.insert(id);
                }
            }
        }
        ids
    }

    /// Distinct tile ids referenced anywhere in the grid
    pub fn referenced_ids(&self) -> BTreeSet<TileId> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Repoint every cell referencing `from`; returns the cells changed
    pub fn replace_id(&mut self, from: TileId, to: Option<TileId>) -> Vec<TileCoord> {
        let positions = self.positions_of(from);
        for coord in &positions {
            self.set(*coord, to);
        }
        positions
    }

    /// Copy cropped/extended to a new grid size, anchored top-left
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let mut resized = Self::new(width, height);
        for (coord, id) in self.mapped_cells() {
            resized.set(coord, Some(id));
        }
        resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_document_rounds_up() {
        let mapping = TileMapping::for_document(40, 32, 16, 16);
        assert_eq!((mapping.width(), mapping.height()), (3, 2));
        assert!(mapping.is_unmapped());
    }

    #[test]
    fn test_set_get_clear() {
        let mut mapping = TileMapping::new(2, 2);
        let cell = TileCoord::new(1, 0);

        assert_eq!(mapping.set(cell, Some(TileId(4))), None);
        assert_eq!(mapping.get(cell), Some(TileId(4)));
        assert_eq!(mapping.clear(cell), Some(TileId(4)));
        assert_eq!(mapping.get(cell), None);

        // Outside the grid
        assert_eq!(mapping.set(TileCoord::new(5, 5), Some(TileId(1))), None);
        assert_eq!(mapping.get(TileCoord::new(5, 5)), None);
    }

    #[test]
    fn test_positions_are_row_major() {
        let mut mapping = TileMapping::new(3, 3);
        mapping.set(TileCoord::new(2, 1), Some(TileId(5)));
        mapping.set(TileCoord::new(0, 2), Some(TileId(5)));
        mapping.set(TileCoord::new(1, 0), Some(TileId(5)));
        mapping.set(TileCoord::new(0, 0), Some(TileId(6)));

        assert_eq!(
            mapping.positions_of(TileId(5)),
            vec![TileCoord::new(1, 0), TileCoord::new(2, 1), TileCoord::new(0, 2)]
        );
    }

    #[test]
    fn test_ids_in_range_clamps() {
        let mut mapping = TileMapping::new(2, 2);
        mapping.set(TileCoord::new(0, 0), Some(TileId(3)));
        mapping.set(TileCoord::new(1, 1), Some(TileId(1)));
        mapping.set(TileCoord::new(1, 0), Some(TileId(3)));

        let ids = mapping.ids_in_range(TileCoord::new(0, 0), TileCoord::new(10, 10));
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![TileId(1), TileId(3)]);

        let ids = mapping.ids_in_range(TileCoord::new(0, 1), TileCoord::new(0, 1));
        assert!(ids.is_empty());
    }

    #[test]
    fn test_replace_id() {
        let mut mapping = TileMapping::new(2, 1);
        mapping.set(TileCoord::new(0, 0), Some(TileId(2)));
        mapping.set(TileCoord::new(1, 0), Some(TileId(2)));

        let changed = mapping.replace_id(TileId(2), None);
        assert_eq!(changed.len(), 2);
        assert!(mapping.is_unmapped());
    }

    #[test]
    fn test_dense_round_trip() {
        let mut mapping = TileMapping::new(2, 2);
        mapping.set(TileCoord::new(1, 1), Some(TileId(7)));
        let dense = mapping.to_dense();
        assert_eq!(dense, vec![-1, -1, -1, 7]);

        let restored = TileMapping::from_dense(2, 2, &dense).unwrap();
        assert_eq!(restored, mapping);

        assert!(TileMapping::from_dense(2, 2, &[0, 1]).is_err());
    }

    #[test]
    fn test_resized_keeps_top_left() {
        let mut mapping = TileMapping::new(3, 3);
        mapping.set(TileCoord::new(0, 0), Some(TileId(1)));
        mapping.set(TileCoord::new(2, 2), Some(TileId(2)));

        let smaller = mapping.resized(2, 2);
        assert_eq!(smaller.get(TileCoord::new(0, 0)), Some(TileId(1)));
        assert_eq!(smaller.referenced_ids().len(), 1);
    }
}
