//! The history item type: a description plus one closed set of change kinds

use crate::document::Document;
use crate::types::{LayerId, PixelRect};

use super::pixels::{PixelChange, TileAwarePixelChange, TileMappedPixelChange};
use super::selection::{SelectionCommitChange, SelectionLiftChange};
use super::stamp::TileStampChange;
use super::structural::StructuralChange;

/// What a history item restores
#[derive(Debug, Clone)]
pub enum Change {
    Pixels(PixelChange),
    TileAwarePixels(TileAwarePixelChange),
    TileMappedPixels(TileMappedPixelChange),
    TileStamp(TileStampChange),
    SelectionLift(SelectionLiftChange),
    SelectionCommit(SelectionCommitChange),
    Structural(StructuralChange),
}

/// One reversible, user-visible edit.
///
/// `apply` and `unapply` only write back stored snapshots; they never
/// re-run propagation.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    description: String,
    change: Change,
}

impl HistoryItem {
    pub fn new(description: impl Into<String>, change: Change) -> Self {
        Self {
            description: description.into(),
            change,
        }
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn change(&self) -> &Change {
        &self.change
    }

    /// False when the item would record nothing
    pub fn can_push_to_history(&self) -> bool {
        match &self.change {
            Change::Pixels(change) => !change.is_empty(),
            Change::TileAwarePixels(change) => !change.is_empty(),
            Change::TileMappedPixels(change) => !change.is_empty(),
            Change::TileStamp(change) => !change.is_empty(),
            Change::SelectionLift(change) => !change.is_empty(),
            Change::SelectionCommit(_) | Change::Structural(_) => true,
        }
    }

    /// Structural items require hosts to re-sync derived state on traversal
    pub fn is_structural(&self) -> bool {
        matches!(self.change, Change::Structural(_))
    }

    /// Layer the item edits, if it targets a single layer
    pub fn layer_id(&self) -> Option<LayerId> {
        match &self.change {
            Change::Pixels(change) => Some(change.layer_id),
            Change::TileAwarePixels(change) => Some(change.layer_id),
            Change::TileMappedPixels(change) => Some(change.layer_id),
            Change::TileStamp(change) => Some(change.layer_id),
            Change::SelectionLift(change) => Some(change.layer_id),
            Change::SelectionCommit(change) => Some(change.layer_id),
            Change::Structural(_) => None,
        }
    }

    /// Approximate bytes held by the stored snapshots
    pub fn memory_size(&self) -> usize {
        match &self.change {
            Change::Pixels(change) => change.memory_size(),
            Change::TileAwarePixels(change) => change.memory_size(),
            Change::TileMappedPixels(change) => change.memory_size(),
            Change::TileStamp(change) => change.memory_size(),
            Change::SelectionLift(change) => change.memory_size(),
            Change::SelectionCommit(change) => change.memory_size(),
            Change::Structural(change) => change.memory_size(),
        }
    }

    /// Re-apply the edit. Returns the document area to recomposite.
    pub fn apply(&self, doc: &mut Document) -> PixelRect {
        self.write(doc, true)
    }

    /// Revert the edit. Returns the document area to recomposite.
    pub fn unapply(&self, doc: &mut Document) -> PixelRect {
        self.write(doc, false)
    }

    fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        match &self.change {
            Change::Pixels(change) => change.write(doc, forward),
            Change::TileAwarePixels(change) => change.write(doc, forward),
            Change::TileMappedPixels(change) => change.write(doc, forward),
            Change::TileStamp(change) => change.write(doc, forward),
            Change::SelectionLift(change) => change.write(doc, forward),
            Change::SelectionCommit(change) => change.write(doc, forward),
            Change::Structural(change) => change.write(doc, forward),
        }
    }
}
