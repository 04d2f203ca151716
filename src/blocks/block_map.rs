// ============================================
// Block Map - Таблица соответствия блоков
// ============================================
// Java блок + состояние <-> ID тайла + aux (data value)

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::block::Block;
use crate::core::{ConvertError, ConvertResult};

/// Блок в формате тайла: ID байт + 4-битный aux
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappedBlock {
    pub id: u8,
    pub aux: u8,
}

impl MappedBlock {
    pub fn new(id: u8, aux: u8) -> Self {
        Self { id, aux }
    }

    /// Первый компонент - ID, второй (если есть) - aux, иначе aux = 0
    pub fn from_components(components: &[u32]) -> Option<Self> {
        let (id, aux) = match components {
            [id] => (*id, 0),
            [id, aux] => (*id, *aux),
            _ => return None,
        };
        if id > u8::MAX as u32 || aux > 0x0f {
            return None;
        }
        Some(Self::new(id as u8, aux as u8))
    }
}

/// Двунаправленная таблица маппинга
pub trait BlockMap {
    /// Java блок -> блок тайла (None если не замаплен)
    fn forward(&self, block: &Block) -> Option<MappedBlock>;
    /// Блок тайла -> Java блок (None если не замаплен)
    fn reverse(&self, id: u8, aux: u8) -> Option<Block>;
}

impl<T: BlockMap + ?Sized> BlockMap for &T {
    fn forward(&self, block: &Block) -> Option<MappedBlock> {
        (**self).forward(block)
    }

    fn reverse(&self, id: u8, aux: u8) -> Option<Block> {
        (**self).reverse(id, aux)
    }
}

/// Запись таблицы в JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMapEntry {
    /// Java ID, например "minecraft:oak_stairs"
    pub java: String,
    /// Свойства состояния, которые должны совпасть
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// [id] или [id, aux]
    pub dungeons: Vec<u32>,
}

/// Файл таблицы
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMapFile {
    #[serde(default = "default_version")]
    pub version: String,
    pub blocks: Vec<BlockMapEntry>,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Таблица, загруженная из JSON
pub struct BlockTable {
    entries: Vec<(Block, MappedBlock)>,
    /// Индексы записей по имени Java блока
    by_name: HashMap<String, Vec<usize>>,
    /// Первая запись для каждой пары id/aux
    by_target: HashMap<MappedBlock, usize>,
}

impl BlockTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            by_target: HashMap::new(),
        }
    }

    /// Загрузить таблицу из JSON строки
    pub fn load_from_json(&mut self, json: &str) -> ConvertResult<usize> {
        let file: BlockMapFile = serde_json::from_str(json)?;

        let count = file.blocks.len();
        for entry in file.blocks {
            let target = MappedBlock::from_components(&entry.dungeons).ok_or_else(|| {
                ConvertError::MalformedDocument(format!(
                    "block map entry {} has invalid target {:?}",
                    entry.java, entry.dungeons
                ))
            })?;
            let mut block = Block::parse(&entry.java);
            block.properties = entry.properties;
            self.register(block, target);
        }
        Ok(count)
    }

    /// Загрузить таблицу из файла
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> ConvertResult<usize> {
        let content = fs::read_to_string(path.as_ref())?;
        self.load_from_json(&content)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        let mut table = Self::new();
        let count = table.load_from_file(path)?;
        log::info!("Loaded {} block map entries", count);
        Ok(table)
    }

    /// Зарегистрировать соответствие
    pub fn register(&mut self, block: Block, target: MappedBlock) {
        let index = self.entries.len();
        self.by_name.entry(block.name()).or_default().push(index);
        self.by_target.entry(target).or_insert(index);
        self.entries.push((block, target));
    }

    /// Количество записей
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for BlockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockMap for BlockTable {
    fn forward(&self, block: &Block) -> Option<MappedBlock> {
        let candidates = self.by_name.get(&block.name())?;

        // Из подходящих берём самую специфичную запись, при равенстве - первую
        let mut best: Option<(usize, MappedBlock)> = None;
        for &index in candidates {
            let (entry, target) = &self.entries[index];
            let matches = entry
                .properties
                .iter()
                .all(|(k, v)| block.properties.get(k) == Some(v));
            if !matches {
                continue;
            }
            let specificity = entry.properties.len();
            if best.map_or(true, |(s, _)| specificity > s) {
                best = Some((specificity, *target));
            }
        }
        best.map(|(_, target)| target)
    }

    fn reverse(&self, id: u8, aux: u8) -> Option<Block> {
        let index = self.by_target.get(&MappedBlock::new(id, aux))?;
        Some(self.entries[*index].0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "blocks": [
            { "java": "minecraft:stone", "dungeons": [1] },
            { "java": "minecraft:oak_stairs", "dungeons": [53] },
            { "java": "minecraft:oak_stairs", "properties": { "facing": "east" }, "dungeons": [53, 1] },
            { "java": "minecraft:light_gray_wool", "dungeons": [35, 8] }
        ]
    }"#;

    fn table() -> BlockTable {
        let mut table = BlockTable::new();
        assert_eq!(table.load_from_json(TABLE).unwrap(), 4);
        table
    }

    #[test]
    fn test_forward_prefers_most_specific() {
        let table = table();
        let east = Block::parse("minecraft:oak_stairs")
            .with_property("facing", "east")
            .with_property("half", "bottom");
        assert_eq!(table.forward(&east), Some(MappedBlock::new(53, 1)));

        let west = Block::parse("minecraft:oak_stairs").with_property("facing", "west");
        assert_eq!(table.forward(&west), Some(MappedBlock::new(53, 0)));
    }

    #[test]
    fn test_forward_unmapped() {
        assert_eq!(table().forward(&Block::parse("minecraft:bamboo")), None);
    }

    #[test]
    fn test_reverse_single_component_means_aux_zero() {
        let table = table();
        assert_eq!(table.reverse(1, 0), Some(Block::parse("minecraft:stone")));
        assert_eq!(table.reverse(1, 3), None);
        assert_eq!(table.reverse(35, 8), Some(Block::parse("minecraft:light_gray_wool")));
        let stairs = table.reverse(53, 1).unwrap();
        assert_eq!(stairs.properties.get("facing").map(String::as_str), Some("east"));
    }

    #[test]
    fn test_invalid_target_rejected() {
        let mut table = BlockTable::new();
        let result = table.load_from_json(r#"{ "blocks": [ { "java": "minecraft:stone", "dungeons": [1, 16] } ] }"#);
        assert!(matches!(result, Err(ConvertError::MalformedDocument(_))));
        assert!(MappedBlock::from_components(&[]).is_none());
        assert!(MappedBlock::from_components(&[256]).is_none());
    }

    #[test]
    fn test_file_version_defaults() {
        let file: BlockMapFile = serde_json::from_str(r#"{ "blocks": [] }"#).unwrap();
        assert_eq!(file.version, "1.0");
        assert_eq!(BlockTable::default().count(), 0);
    }
}
