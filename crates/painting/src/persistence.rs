//! JSON document files
//!
//! A saved document holds the canvas size, the tile set (tile size, id
//! counter and every definition), each layer's pixels and dense mapping
//! grid, and the active layer. History, the selection and any floating
//! selection are session state and are not saved.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::DOCUMENT_FORMAT_VERSION;
use crate::document::Document;
use crate::error::PaintError;
use crate::layer::RasterLayer;
use crate::selection::SelectionRegion;
use crate::surface::{PixelSurface, buffer_len};
use crate::tiles::{TileMapping, TileSet};
use crate::types::{LayerId, TileId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileFile {
    pub id: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSetFile {
    pub tile_width: u32,
    pub tile_height: u32,
    pub next_id: u32,
    pub tiles: Vec<TileFile>,
}

/// Mapping grid in row-major order; `-1` marks an unmapped cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingFile {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerFile {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub pixels: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingFile>,
}

fn default_visible() -> bool {
    true
}

/// Serialized form of a [`Document`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFile {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_set: Option<TileSetFile>,
    pub layers: Vec<LayerFile>,
    pub active_layer: u64,
}

impl DocumentFile {
    pub fn from_document(doc: &Document) -> Self {
        let tile_set = doc.tile_set().map(|set| TileSetFile {
            tile_width: set.tile_width(),
            tile_height: set.tile_height(),
            next_id: set.next_id(),
            tiles: set
                .snapshot()
                .into_iter()
                .map(|(id, pixels)| TileFile { id: id.0, pixels })
                .collect(),
        });
        let layers = doc
            .layers()
            .iter()
            .map(|layer| LayerFile {
                id: layer.id.0,
                name: layer.name.clone(),
                visible: layer.visible,
                pixels: layer.surface.pixels().to_vec(),
                mapping: layer.mapping.as_ref().map(|mapping| MappingFile {
                    width: mapping.width(),
                    height: mapping.height(),
                    cells: mapping.to_dense(),
                }),
            })
            .collect();
        Self {
            version: DOCUMENT_FORMAT_VERSION,
            width: doc.width(),
            height: doc.height(),
            tile_set,
            layers,
            active_layer: doc.active_layer_id().0,
        }
    }

    /// Validate and rebuild the document.
    ///
    /// Mapping cells referencing tiles missing from the set are cleared with
    /// a warning; size mismatches are reported as [`PaintError::Corrupt`].
    pub fn into_document(self) -> Result<Document, PaintError> {
        if self.version > DOCUMENT_FORMAT_VERSION {
            return Err(PaintError::Corrupt(format!(
                "unsupported format version {}",
                self.version
            )));
        }
        if self.layers.is_empty() {
            return Err(PaintError::Corrupt("document has no layers".into()));
        }
        let mut doc = Document::new(self.width, self.height)?;

        if let Some(set) = self.tile_set {
            let tiles = set
                .tiles
                .into_iter()
                .map(|tile| (TileId(tile.id), tile.pixels))
                .collect();
            doc.tile_set = Some(
                TileSet::from_parts(set.tile_width, set.tile_height, set.next_id, tiles)
                    .map_err(|err| PaintError::Corrupt(format!("tile set: {err}")))?,
            );
        }
        let grid = doc.tile_grid_size();

        let mut layers = Vec::with_capacity(self.layers.len());
        for file in self.layers {
            let id = LayerId(file.id);
            if layers.iter().any(|layer: &RasterLayer| layer.id == id) {
                return Err(PaintError::Corrupt(format!("duplicate layer id {id}")));
            }
            if file.pixels.len() != buffer_len(self.width, self.height) {
                return Err(PaintError::Corrupt(format!(
                    "layer {id} has {} pixel bytes, expected {}",
                    file.pixels.len(),
                    buffer_len(self.width, self.height)
                )));
            }
            let surface = PixelSurface::from_pixels(self.width, self.height, file.pixels)?;
            let mapping = match file.mapping {
                Some(mapping) => Some(Self::load_mapping(&doc, grid, id, mapping)?),
                None => None,
            };
            layers.push(RasterLayer {
                id,
                name: file.name,
                visible: file.visible,
                surface,
                mapping,
            });
        }

        doc.next_layer_id = layers.iter().map(|layer| layer.id.0 + 1).max().unwrap_or(0);
        doc.layers = layers;
        let active = LayerId(self.active_layer);
        doc.active_layer = if doc.layer(active).is_some() {
            active
        } else {
            warn!("Persistence: active layer {} missing, using the bottom layer", active);
            doc.layers[0].id
        };
        doc.selection = SelectionRegion::new();
        info!(
            "Persistence: loaded {}x{} document, {} layer(s), {} tile(s)",
            doc.width(),
            doc.height(),
            doc.layer_count(),
            doc.tile_set().map_or(0, TileSet::len)
        );
        Ok(doc)
    }

    fn load_mapping(
        doc: &Document,
        grid: Option<(u32, u32)>,
        layer_id: LayerId,
        file: MappingFile,
    ) -> Result<TileMapping, PaintError> {
        let (grid_w, grid_h) = grid.ok_or_else(|| {
            PaintError::Corrupt(format!("layer {layer_id} has a mapping but there is no tile set"))
        })?;
        if (file.width, file.height) != (grid_w, grid_h) {
            return Err(PaintError::Corrupt(format!(
                "layer {layer_id} mapping is {}x{}, expected {grid_w}x{grid_h}",
                file.width, file.height
            )));
        }
        let mut mapping = TileMapping::from_dense(file.width, file.height, &file.cells)?;
        let stale: Vec<TileId> = mapping
            .referenced_ids()
            .into_iter()
            .filter(|id| !doc.tile_set().is_some_and(|set| set.contains(*id)))
            .collect();
        for id in stale {
            let cleared = mapping.replace_id(id, None);
            warn!(
                "Persistence: layer {} references missing tile {}, unmapped {} cell(s)",
                layer_id,
                id,
                cleared.len()
            );
        }
        Ok(mapping)
    }

    pub fn to_json(&self) -> Result<String, PaintError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PaintError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Document {
    /// Serialize to a JSON document file
    pub fn to_json(&self) -> Result<String, PaintError> {
        DocumentFile::from_document(self).to_json()
    }

    /// Load from a JSON document file
    pub fn from_json(json: &str) -> Result<Self, PaintError> {
        DocumentFile::from_json(json)?.into_document()
    }
}
