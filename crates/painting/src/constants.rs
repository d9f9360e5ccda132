/// Bytes per BGRA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Fully transparent BGRA pixel.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Cell value used by persisted mapping grids for "no tile".
pub const UNMAPPED_CELL: i32 = -1;

/// Document file schema version.
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// Name given to the first layer of a new document.
pub const DEFAULT_LAYER_NAME: &str = "Background";
