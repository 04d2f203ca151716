// ============================================
// Tilekit - Тайлы object group <-> мир из блоков
// ============================================

pub mod blocks;
pub mod convert;
pub mod core;
pub mod tile;
pub mod world;

pub use crate::blocks::{Block, BlockMap, BlockRemapper, BlockTable, MappedBlock};
pub use crate::convert::{TileToWorldConverter, WorldToTileConverter};
pub use crate::core::{ConvertConfig, ConvertError, ConvertResult, DiagnosticsSink};
pub use crate::tile::{ObjectGroup, ObjectGroupDocument, Tile};
pub use crate::world::{MemoryWorld, RegionDirectory, RegionStore, RegionWriter, WorldReader};
