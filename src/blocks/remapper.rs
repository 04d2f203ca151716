// ============================================
// Block Remapper - Маппинг с политикой предупреждений
// ============================================
// Незамапленный блок никогда не фатален: вперёд он становится воздухом,
// назад - пропускается. Каждый уникальный блок репортится один раз.

use std::collections::HashSet;

use super::block::Block;
use super::block_map::{BlockMap, MappedBlock};
use crate::core::{ConvertError, ConvertResult, Diagnostic, DiagnosticsSink};

pub struct BlockRemapper<M: BlockMap> {
    map: M,
    reported_sources: HashSet<Block>,
    reported_targets: HashSet<MappedBlock>,
    /// Сколько вокселей ушло в воздух / было пропущено
    unmapped_forward: usize,
    unmapped_reverse: usize,
}

impl<M: BlockMap> BlockRemapper<M> {
    pub fn new(map: M) -> Self {
        Self {
            map,
            reported_sources: HashSet::new(),
            reported_targets: HashSet::new(),
            unmapped_forward: 0,
            unmapped_reverse: 0,
        }
    }

    /// Строгий вариант: незамапленный блок - ошибка UnmappedBlock
    pub fn try_forward(&self, block: &Block) -> ConvertResult<MappedBlock> {
        self.map
            .forward(block)
            .ok_or_else(|| ConvertError::UnmappedBlock(block.to_string()))
    }

    /// Java блок -> блок тайла, с предупреждением при промахе
    pub fn forward(&mut self, block: &Block, sink: &mut dyn DiagnosticsSink) -> Option<MappedBlock> {
        match self.try_forward(block) {
            Ok(mapped) => Some(mapped),
            Err(_) => {
                self.unmapped_forward += 1;
                if self.reported_sources.insert(block.clone()) {
                    sink.report(Diagnostic::UnmappedSource { block: block.clone() });
                }
                None
            }
        }
    }

    /// Блок тайла -> Java блок, с предупреждением при промахе
    pub fn reverse(&mut self, id: u8, aux: u8, sink: &mut dyn DiagnosticsSink) -> Option<Block> {
        let block = self.map.reverse(id, aux);
        if block.is_none() {
            self.unmapped_reverse += 1;
            if self.reported_targets.insert(MappedBlock::new(id, aux)) {
                sink.report(Diagnostic::UnmappedTarget { id, aux });
            }
        }
        block
    }

    pub fn unmapped_forward(&self) -> usize {
        self.unmapped_forward
    }

    pub fn unmapped_reverse(&self) -> usize {
        self.unmapped_reverse
    }

    pub fn map(&self) -> &M {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockTable;
    use crate::core::CollectingSink;

    fn table() -> BlockTable {
        let mut table = BlockTable::new();
        table.register(Block::parse("minecraft:stone"), MappedBlock::new(1, 0));
        table
    }

    #[test]
    fn test_unmapped_source_reported_once() {
        let mut remapper = BlockRemapper::new(table());
        let mut sink = CollectingSink::new();
        let bamboo = Block::parse("minecraft:bamboo").with_property("age", "0");

        assert_eq!(remapper.forward(&bamboo, &mut sink), None);
        assert_eq!(remapper.forward(&bamboo, &mut sink), None);
        assert_eq!(remapper.forward(&Block::parse("minecraft:stone"), &mut sink), Some(MappedBlock::new(1, 0)));

        assert_eq!(sink.diagnostics, vec![Diagnostic::UnmappedSource { block: bamboo }]);
        assert_eq!(remapper.unmapped_forward(), 2);
    }

    #[test]
    fn test_unmapped_target_reported() {
        let mut remapper = BlockRemapper::new(table());
        let mut sink = CollectingSink::new();
        assert_eq!(remapper.reverse(9, 2, &mut sink), None);
        assert_eq!(remapper.reverse(1, 0, &mut sink), Some(Block::parse("minecraft:stone")));
        assert_eq!(sink.diagnostics, vec![Diagnostic::UnmappedTarget { id: 9, aux: 2 }]);
    }

    #[test]
    fn test_try_forward_is_strict() {
        let remapper = BlockRemapper::new(table());
        assert!(matches!(
            remapper.try_forward(&Block::parse("minecraft:bamboo")),
            Err(ConvertError::UnmappedBlock(name)) if name == "minecraft:bamboo"
        ));
    }
}
