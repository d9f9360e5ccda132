//! Selection regions stored as sorted, non-overlapping horizontal runs per row

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::PixelRect;

/// Half-open run `[start, end)` of selected pixels on one row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: i32,
    pub end: i32,
}

impl Span {
    #[inline]
    pub fn len(&self) -> usize {
        (self.end - self.start).max(0) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Set of selected document pixels.
///
/// Each row holds sorted, non-overlapping, non-adjacent spans; rows with no
/// spans are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRegion {
    rows: BTreeMap<i32, Vec<Span>>,
}

impl SelectionRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region covering a single rectangle
    pub fn from_rect(rect: PixelRect) -> Self {
        let mut region = Self::new();
        region.add_rect(rect);
        region
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Replace this region with a copy of `other`
    pub fn copy_from(&mut self, other: &SelectionRegion) {
        self.rows.clone_from(&other.rows);
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rows
            .get(&y)
            .is_some_and(|spans| spans.iter().any(|span| x >= span.start && x < span.end))
    }

    /// Minimal enclosing rectangle (empty for an empty region)
    pub fn bounds(&self) -> PixelRect {
        let (Some((&min_y, _)), Some((&max_y, _))) =
            (self.rows.first_key_value(), self.rows.last_key_value())
        else {
            return PixelRect::EMPTY;
        };
        let mut min_x = i32::MAX;
        let mut max_x = i32::MIN;
        for spans in self.rows.values() {
            if let (Some(first), Some(last)) = (spans.first(), spans.last()) {
                min_x = min_x.min(first.start);
                max_x = max_x.max(last.end);
            }
        }
        PixelRect::new(min_x, min_y, max_x - min_x, max_y - min_y + 1)
    }

    pub fn pixel_count(&self) -> usize {
        self.rows
            .values()
            .flat_map(|spans| spans.iter())
            .map(Span::len)
            .sum()
    }

    /// All `(row, span)` pairs, top to bottom then left to right
    pub fn spans(&self) -> impl Iterator<Item = (i32, Span)> + '_ {
        self.rows
            .iter()
            .flat_map(|(&y, spans)| spans.iter().map(move |span| (y, *span)))
    }

    /// Every selected pixel coordinate in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.spans()
            .flat_map(|(y, span)| (span.start..span.end).map(move |x| (x, y)))
    }

    pub fn add_rect(&mut self, rect: PixelRect) {
        if rect.is_empty() {
            return;
        }
        for y in rect.y..rect.bottom() {
            let spans = self.rows.entry(y).or_default();
            insert_span(
                spans,
                Span {
                    start: rect.x,
                    end: rect.right(),
                },
            );
        }
    }

    pub fn subtract_rect(&mut self, rect: PixelRect) {
        if rect.is_empty() {
            return;
        }
        for y in rect.y..rect.bottom() {
            if let Some(spans) = self.rows.get_mut(&y) {
                remove_span(spans, rect.x, rect.right());
                if spans.is_empty() {
                    self.rows.remove(&y);
                }
            }
        }
    }

    pub fn union_with(&mut self, other: &SelectionRegion) {
        for (y, span) in other.spans() {
            insert_span(self.rows.entry(y).or_default(), span);
        }
    }

    pub fn subtract(&mut self, other: &SelectionRegion) {
        for (y, span) in other.spans() {
            if let Some(spans) = self.rows.get_mut(&y) {
                remove_span(spans, span.start, span.end);
                if spans.is_empty() {
                    self.rows.remove(&y);
                }
            }
        }
    }

    pub fn intersect_with(&mut self, other: &SelectionRegion) {
        let mut result = BTreeMap::new();
        for (y, spans) in &self.rows {
            let Some(other_spans) = other.rows.get(y) else {
                continue;
            };
            let mut row = Vec::new();
            for a in spans {
                for b in other_spans {
                    let start = a.start.max(b.start);
                    let end = a.end.min(b.end);
                    if start < end {
                        row.push(Span { start, end });
                    }
                }
            }
            if !row.is_empty() {
                result.insert(*y, row);
            }
        }
        self.rows = result;
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let rows = std::mem::take(&mut self.rows);
        self.rows = rows
            .into_iter()
            .map(|(y, spans)| {
                let spans = spans
                    .into_iter()
                    .map(|span| Span {
                        start: span.start + dx,
                        end: span.end + dx,
                    })
                    .collect();
                (y + dy, spans)
            })
            .collect();
    }

    /// Drop everything outside a `width x height` canvas
    pub fn clip_to(&mut self, width: u32, height: u32) {
        let canvas = SelectionRegion::from_rect(PixelRect::of_size(width, height));
        self.intersect_with(&canvas);
    }
}

/// Insert a span, merging with overlapping or touching neighbours
fn insert_span(spans: &mut Vec<Span>, mut span: Span) {
    if span.is_empty() {
        return;
    }
    let mut merged = Vec::with_capacity(spans.len() + 1);
    let mut placed = false;
    for existing in spans.drain(..) {
        if existing.end < span.start {
            merged.push(existing);
        } else if existing.start > span.end {
            if !placed {
                merged.push(span);
                placed = true;
            }
            merged.push(existing);
        } else {
            span.start = span.start.min(existing.start);
            span.end = span.end.max(existing.end);
        }
    }
    if !placed {
        merged.push(span);
    }
    *spans = merged;
}

/// Remove `[start, end)` from a row, splitting spans as needed
fn remove_span(spans: &mut Vec<Span>, start: i32, end: i32) {
    if end <= start {
        return;
    }
    let mut kept = Vec::with_capacity(spans.len() + 1);
    for span in spans.drain(..) {
        if span.end <= start || span.start >= end {
            kept.push(span);
            continue;
        }
        if span.start < start {
            kept.push(Span {
                start: span.start,
                end: start,
            });
        }
        if span.end > end {
            kept.push(Span {
                start: end,
                end: span.end,
            });
        }
    }
    *spans = kept;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rect_and_contains() {
        let region = SelectionRegion::from_rect(PixelRect::new(2, 3, 4, 2));
        assert!(region.contains(2, 3));
        assert!(region.contains(5, 4));
        assert!(!region.contains(6, 4));
        assert!(!region.contains(2, 5));
        assert_eq!(region.pixel_count(), 8);
        assert_eq!(region.bounds(), PixelRect::new(2, 3, 4, 2));
    }

    #[test]
    fn test_adjacent_spans_merge() {
        let mut region = SelectionRegion::from_rect(PixelRect::new(0, 0, 2, 1));
        region.add_rect(PixelRect::new(2, 0, 2, 1));
        region.add_rect(PixelRect::new(10, 0, 1, 1));
        let spans: Vec<_> = region.spans().collect();
        assert_eq!(
            spans,
            vec![(0, Span { start: 0, end: 4 }), (0, Span { start: 10, end: 11 })]
        );

        // Bridge the gap
        region.add_rect(PixelRect::new(3, 0, 8, 1));
        assert_eq!(region.spans().count(), 1);
    }

    #[test]
    fn test_subtract_rect_splits() {
        let mut region = SelectionRegion::from_rect(PixelRect::new(0, 0, 10, 2));
        region.subtract_rect(PixelRect::new(3, 0, 4, 1));
        assert!(region.contains(2, 0));
        assert!(!region.contains(3, 0));
        assert!(region.contains(7, 0));
        assert!(region.contains(5, 1));
        assert_eq!(region.pixel_count(), 16);

        region.subtract_rect(PixelRect::new(0, 0, 10, 2));
        assert!(region.is_empty());
        assert_eq!(region.bounds(), PixelRect::EMPTY);
    }

    #[test]
    fn test_boolean_composition() {
        let a = SelectionRegion::from_rect(PixelRect::new(0, 0, 4, 4));
        let b = SelectionRegion::from_rect(PixelRect::new(2, 2, 4, 4));

        let mut union = a.clone();
        union.union_with(&b);
        assert_eq!(union.pixel_count(), 16 + 16 - 4);

        let mut intersection = a.clone();
        intersection.intersect_with(&b);
        assert_eq!(intersection.bounds(), PixelRect::new(2, 2, 2, 2));

        let mut difference = a.clone();
        difference.subtract(&b);
        assert_eq!(difference.pixel_count(), 12);
        assert!(!difference.contains(3, 3));
    }

    #[test]
    fn test_translate_and_clip() {
        let mut region = SelectionRegion::from_rect(PixelRect::new(0, 0, 4, 4));
        region.translate(-2, 1);
        assert_eq!(region.bounds(), PixelRect::new(-2, 1, 4, 4));

        region.clip_to(8, 4);
        assert_eq!(region.bounds(), PixelRect::new(0, 1, 2, 3));
    }

    #[test]
    fn test_copy_from() {
        let source = SelectionRegion::from_rect(PixelRect::new(1, 1, 1, 1));
        let mut target = SelectionRegion::from_rect(PixelRect::new(5, 5, 5, 5));
        target.copy_from(&source);
        assert_eq!(target, source);
    }
}
