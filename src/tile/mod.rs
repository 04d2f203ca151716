// ============================================
// Tile Module - Формат тайлов object group
// ============================================

pub mod codec;
mod document;
mod grid;
mod markers;
mod object;
pub mod pretty;

pub use document::{ObjectGroup, ObjectGroupDocument, TileDocument};
pub use grid::{blocks_len, PackedVoxelGrid, MAX_AUX};
pub use markers::{decode_boundaries, encode_boundaries, Boundary, Door, Region};
pub use object::{Tile, TileSummary};
