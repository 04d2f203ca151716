// ============================================
// Blocks - Блоки мира и таблица маппинга
// ============================================
// Data-Driven: таблица соответствия грузится из JSON

mod block;
mod block_map;
mod remapper;

pub use block::*;
pub use block_map::*;
pub use remapper::*;
