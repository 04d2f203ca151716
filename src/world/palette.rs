// ============================================
// Block Palette - Палитра блоков секции
// ============================================
// Превращает Block в компактные индексы 0..N, индекс 0 всегда воздух

use std::collections::HashMap;

use crate::blocks::Block;

#[derive(Debug, Clone)]
pub struct BlockPalette {
    blocks: Vec<Block>,
    /// Block -> индекс, после чтения с диска восстанавливается from_blocks
    reverse_map: HashMap<Block, u16>,
}

impl BlockPalette {
    pub fn new() -> Self {
        Self::from_blocks(vec![Block::air()])
    }

    /// Палитра из готового списка (после чтения с диска).
    /// При повторах побеждает первый индекс
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let reverse_map = blocks
            .iter()
            .enumerate()
            .rev()
            .map(|(i, block)| (block.clone(), i as u16))
            .collect();
        Self { blocks, reverse_map }
    }

    /// Индекс блока в палитре, новый блок дописывается в конец
    pub fn get_or_insert(&mut self, block: &Block) -> u16 {
        if let Some(&index) = self.reverse_map.get(block) {
            return index;
        }
        let index = self.blocks.len() as u16;
        self.reverse_map.insert(block.clone(), index);
        self.blocks.push(block.clone());
        index
    }

    pub fn get(&self, index: u16) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Ширина индекса при упаковке секции: 1, 2, 4, 8 или 16 бит
    pub fn bits_per_index(&self) -> u8 {
        match self.blocks.len() {
            0..=2 => 1,
            3..=4 => 2,
            5..=16 => 4,
            17..=256 => 8,
            _ => 16,
        }
    }
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self::new()
    }
}
