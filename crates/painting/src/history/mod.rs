//! Unified undo/redo history
//!
//! A single ordered list of [`HistoryItem`]s with an applied-count pointer.
//! Pushing after undos discards the redo tail.

mod deltas;
mod item;
mod pixels;
mod selection;
mod stamp;
mod structural;

use tracing::debug;

use crate::document::Document;
use crate::types::PixelRect;

pub use deltas::{NonTileDelta, PixelRegion, TileDelta};
pub use item::{Change, HistoryItem};
pub use pixels::{PixelChange, TileAwarePixelChange, TileMappedPixelChange};
pub use selection::{SelectionCommitChange, SelectionLiftChange};
pub use stamp::{MappingChange, TileStampChange};
pub use structural::{CanvasState, StructuralChange};

pub(crate) use deltas::packed_at;

/// Result of one undo or redo step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traversal {
    pub description: String,
    pub dirty: PixelRect,
    /// Host must re-sync derived state
    pub structural: bool,
}

/// Undo/redo stack
#[derive(Debug, Default)]
pub struct HistoryStack {
    items: Vec<HistoryItem>,
    /// Items `[0, applied_count)` are applied
    applied_count: usize,
    /// Oldest items are dropped beyond this many (None = unlimited)
    limit: Option<usize>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack keeping at most `limit` items (`None` = unlimited)
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit: limit.filter(|limit| *limit > 0),
            ..Self::default()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn applied_count(&self) -> usize {
        self.applied_count
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.applied_count > 0
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.applied_count < self.items.len()
    }

    /// Record an already-performed edit.
    ///
    /// Items that record nothing are rejected (returns false). Otherwise the
    /// redo tail is discarded and the item appended as applied.
    pub fn push(&mut self, item: HistoryItem) -> bool {
        if !item.can_push_to_history() {
            debug!("History: '{}' recorded nothing, not pushed", item.description());
            return false;
        }
        self.items.truncate(self.applied_count);
        debug!("History: push '{}'", item.description());
        self.items.push(item);
        self.applied_count = self.items.len();

        if let Some(limit) = self.limit {
            let excess = self.items.len().saturating_sub(limit);
            if excess > 0 {
                self.items.drain(..excess);
                self.applied_count -= excess;
            }
        }
        true
    }

    /// Item the next undo would revert
    pub fn peek_undo(&self) -> Option<&HistoryItem> {
        self.applied_count
            .checked_sub(1)
            .and_then(|index| self.items.get(index))
    }

    /// Item the next redo would re-apply
    pub fn peek_redo(&self) -> Option<&HistoryItem> {
        self.items.get(self.applied_count)
    }

    pub fn undo(&mut self, doc: &mut Document) -> Option<Traversal> {
        let index = self.applied_count.checked_sub(1)?;
        let item = &self.items[index];
        let dirty = item.unapply(doc);
        self.applied_count = index;
        debug!("History: undo '{}' ({} applied)", item.description(), self.applied_count);
        Some(Traversal {
            description: item.description().to_string(),
            dirty,
            structural: item.is_structural(),
        })
    }

    pub fn redo(&mut self, doc: &mut Document) -> Option<Traversal> {
        let item = self.items.get(self.applied_count)?;
        let dirty = item.apply(doc);
        self.applied_count += 1;
        debug!("History: redo '{}' ({} applied)", item.description(), self.applied_count);
        Some(Traversal {
            description: item.description().to_string(),
            dirty,
            structural: item.is_structural(),
        })
    }

    /// Undo or redo until `applied_count == target` (clamped to the stack)
    pub fn jump_to(&mut self, doc: &mut Document, target: usize) -> Vec<Traversal> {
        let target = target.min(self.items.len());
        let mut steps = Vec::new();
        while self.applied_count > target {
            match self.undo(doc) {
                Some(step) => steps.push(step),
                None => break,
            }
        }
        while self.applied_count < target {
            match self.redo(doc) {
                Some(step) => steps.push(step),
                None => break,
            }
        }
        steps
    }

    /// Drop every item
    pub fn clear(&mut self) {
        self.items.clear();
        self.applied_count = 0;
    }

    /// Item descriptions, oldest first
    pub fn descriptions(&self) -> Vec<&str> {
        self.items.iter().map(HistoryItem::description).collect()
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Approximate bytes held by all items
    pub fn memory_size(&self) -> usize {
        self.items.iter().map(HistoryItem::memory_size).sum()
    }
}
