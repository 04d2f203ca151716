// ============================================
// World Module - Доступ к миру из блоков
// ============================================
// WorldReader читает блоки по абсолютным координатам,
// RegionStore/RegionWriter пишут их по партициям

mod access;
mod header;
mod memory;
mod palette;
mod region_file;

pub use access::{BlockPos, PartitionKey, RegionStore, RegionWriter, WorldError, WorldReader};
pub use header::{RegionHeader, MAGIC_NUMBER, REGION_VERSION};
pub use memory::{MemoryRegion, MemoryWorld};
pub use palette::BlockPalette;
pub use region_file::{Partition, PartitionWriter, RegionDirectory, SECTION_SIZE};
