// ============================================
// Memory World - Мир целиком в памяти
// ============================================
// Хэндл клонируется: читатель и партиции пишут в одну карту

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::access::{BlockPos, PartitionKey, RegionStore, RegionWriter, WorldError, WorldReader};
use crate::blocks::Block;

#[derive(Default)]
struct MemoryState {
    blocks: HashMap<BlockPos, Block>,
    /// Сколько раз сохранялась каждая партиция
    saves: HashMap<PartitionKey, usize>,
}

#[derive(Clone)]
pub struct MemoryWorld {
    state: Rc<RefCell<MemoryState>>,
    min_y: i32,
    max_y: i32,
}

impl MemoryWorld {
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            state: Rc::new(RefCell::new(MemoryState::default())),
            min_y,
            max_y,
        }
    }

    /// Поставить блок напрямую
    pub fn put(&self, block: Block, x: i32, y: i32, z: i32) {
        self.state.borrow_mut().blocks.insert(BlockPos::new(x, y, z), block);
    }

    /// Блок без проверки высоты (None - воздух)
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        self.state.borrow().blocks.get(&BlockPos::new(x, y, z)).cloned()
    }

    /// Количество непустых позиций
    pub fn len(&self) -> usize {
        self.state.borrow().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn save_count(&self, key: PartitionKey) -> usize {
        self.state.borrow().saves.get(&key).copied().unwrap_or(0)
    }

    /// Все партиции, которые хоть раз сохранялись
    pub fn saved_partitions(&self) -> Vec<PartitionKey> {
        let mut keys: Vec<PartitionKey> = self.state.borrow().saves.keys().copied().collect();
        keys.sort();
        keys
    }

    fn check_height(&self, y: i32) -> Result<(), WorldError> {
        if y < self.min_y || y >= self.max_y {
            return Err(WorldError::OutOfRange(format!(
                "y={} is outside the world height {}..{}",
                y, self.min_y, self.max_y
            )));
        }
        Ok(())
    }
}

impl WorldReader for MemoryWorld {
    fn block(&mut self, x: i32, y: i32, z: i32) -> Result<Block, WorldError> {
        self.check_height(y)?;
        Ok(self.get(x, y, z).unwrap_or_else(Block::air))
    }
}

impl RegionStore for MemoryWorld {
    type Region = MemoryRegion;

    fn create_region(&mut self, key: PartitionKey, partition_size: i32) -> Result<MemoryRegion, WorldError> {
        Ok(MemoryRegion {
            key,
            partition_size,
            world: self.clone(),
            pending: HashMap::new(),
        })
    }
}

/// Партиция MemoryWorld: копит записи до save
pub struct MemoryRegion {
    key: PartitionKey,
    partition_size: i32,
    world: MemoryWorld,
    pending: HashMap<BlockPos, Block>,
}

impl RegionWriter for MemoryRegion {
    fn set_block(&mut self, block: &Block, x: i32, y: i32, z: i32) -> Result<(), WorldError> {
        self.world.check_height(y)?;
        let pos = BlockPos::new(x, y, z);
        if pos.partition_key(self.partition_size) != self.key {
            return Err(WorldError::OutOfRange(format!(
                "column ({}, {}) is not in partition {:?}",
                x, z, self.key
            )));
        }
        self.pending.insert(pos, block.clone());
        Ok(())
    }

    fn save(&mut self) -> Result<(), WorldError> {
        let mut state = self.world.state.borrow_mut();
        for (pos, block) in &self.pending {
            state.blocks.insert(*pos, block.clone());
        }
        *state.saves.entry(self.key).or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_visible_after_save() {
        let mut world = MemoryWorld::new(0, 256);
        let mut region = world.create_region(PartitionKey::new(0, 0), 16).unwrap();
        region.set_block(&Block::parse("minecraft:stone"), 1, 2, 3).unwrap();
        assert_eq!(world.block(1, 2, 3).unwrap(), Block::air());

        region.save().unwrap();
        assert_eq!(world.block(1, 2, 3).unwrap(), Block::parse("minecraft:stone"));
        assert_eq!(world.save_count(PartitionKey::new(0, 0)), 1);
    }

    #[test]
    fn test_bounds() {
        let mut world = MemoryWorld::new(0, 16);
        assert!(matches!(world.block(0, 16, 0), Err(WorldError::OutOfRange(_))));
        let mut region = world.create_region(PartitionKey::new(0, 0), 16).unwrap();
        assert!(matches!(
            region.set_block(&Block::parse("minecraft:stone"), 16, 0, 0),
            Err(WorldError::OutOfRange(_))
        ));
    }
}
