//! Tile stamp history item: a mapping cell assignment plus the block pixels

use std::collections::BTreeMap;

use tracing::warn;

use crate::document::Document;
use crate::types::{LayerId, PixelRect, TileCoord, TileId};

use super::deltas::{PixelRegion, write_region};

/// Mapping cell value before and after a stamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingChange {
    pub coord: TileCoord,
    pub before: Option<TileId>,
    pub after: Option<TileId>,
}

/// A tile stamped into (or removed from) one grid cell.
///
/// `tile_states` holds the definitions referenced by the cell at stamp time;
/// they are written back in both directions so the block and definition
/// always agree after traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileStampChange {
    pub layer_id: LayerId,
    pub region: PixelRegion,
    pub mapping_change: Option<MappingChange>,
    pub tile_states: BTreeMap<TileId, Vec<u8>>,
}

impl TileStampChange {
    pub fn is_empty(&self) -> bool {
        self.region.is_noop()
            && self
                .mapping_change
                .is_none_or(|change| change.before == change.after)
    }

    pub fn memory_size(&self) -> usize {
        self.region.memory_size() + self.tile_states.values().map(Vec::len).sum::<usize>()
    }

    pub(crate) fn write(&self, doc: &mut Document, forward: bool) -> PixelRect {
        if let Some(tile_set) = doc.tile_set.as_mut() {
            for (id, pixels) in &self.tile_states {
                if let Ok(false) = tile_set.update_tile_pixels(*id, pixels.clone()) {
                    warn!("History: stamped tile {} no longer exists", id);
                }
            }
        }

        if let Some(change) = self.mapping_change {
            let mut value = if forward { change.after } else { change.before };
            if let Some(id) = value {
                if !doc.tile_set().is_some_and(|tile_set| tile_set.contains(id)) {
                    warn!("History: tile {} no longer exists, cell left unmapped", id);
                    value = None;
                }
            }
            match doc.layer_mut(self.layer_id).and_then(|layer| layer.mapping.as_mut()) {
                Some(mapping) => {
                    mapping.set(change.coord, value);
                }
                None => warn!("History: layer {} has no tile mapping", self.layer_id),
            }
        }

        write_region(doc, self.layer_id, &self.region, forward)
    }
}
