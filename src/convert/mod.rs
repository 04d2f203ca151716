// ============================================
// Convert Module - Конвертация мир <-> тайлы
// ============================================
// WorldToTileConverter: WorldReader -> детекторы/ремаппер -> Tile
// TileToWorldConverter: Tile -> ремаппер -> партиции RegionStore

mod detector;
mod tile_to_world;
mod world_to_tile;

pub use detector::{player_start, BoundaryTracker, DoorBox, DoorDetector, MarkerKind};
pub use tile_to_world::{save_layout, PartitionCache, TileToWorldConverter};
pub use world_to_tile::{load_layout, WorldToTileConverter};
