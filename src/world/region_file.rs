// ============================================
// Region File - Файлы партиций мира
// ============================================
// Формат r.<x>.<z>.dat:
// - заголовок (bincode)
// - тело (bincode + ZSTD): секции 16x16x16 с палитрой и упакованными индексами
//
// Хранятся только секции, где есть хоть что-то кроме воздуха.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::access::{PartitionKey, RegionStore, RegionWriter, WorldError, WorldReader};
use super::header::{RegionHeader, MAGIC_NUMBER};
use super::palette::BlockPalette;
use crate::blocks::Block;

/// Размер секции (16x16x16)
pub const SECTION_SIZE: i32 = 16;
const SECTION_VOLUME: usize = 16 * 16 * 16; // 4096

/// Уровень ZSTD сжатия
const ZSTD_LEVEL: i32 = 3;

/// Ключ секции: (section_x, section_y, section_z) в абсолютных секциях
type SectionKey = (i32, i32, i32);

/// Индекс блока внутри секции
#[inline]
fn section_index(x: i32, y: i32, z: i32) -> usize {
    let lx = x.rem_euclid(SECTION_SIZE) as usize;
    let ly = y.rem_euclid(SECTION_SIZE) as usize;
    let lz = z.rem_euclid(SECTION_SIZE) as usize;
    ly * 256 + lz * 16 + lx
}

#[inline]
fn section_key(x: i32, y: i32, z: i32) -> SectionKey {
    (x.div_euclid(SECTION_SIZE), y.div_euclid(SECTION_SIZE), z.div_euclid(SECTION_SIZE))
}

/// Секция в памяти
#[derive(Debug, Clone)]
struct Section {
    palette: BlockPalette,
    indices: Vec<u16>,
}

impl Section {
    fn new() -> Self {
        Self {
            palette: BlockPalette::new(),
            indices: vec![0; SECTION_VOLUME],
        }
    }

    fn is_air_only(&self) -> bool {
        self.indices.iter().all(|&i| i == 0)
    }
}

/// Секция на диске
#[derive(Debug, Serialize, Deserialize)]
struct SavedSection {
    sx: i32,
    sy: i32,
    sz: i32,
    palette: Vec<Block>,
    /// Индексы в палитру, упакованы по bits_per_block
    data: Vec<u8>,
    /// Бит на индекс (1, 2, 4, 8, 16)
    bits_per_block: u8,
}

/// Тело файла (сжимается ZSTD)
#[derive(Debug, Serialize, Deserialize)]
struct PartitionBody {
    sections: Vec<SavedSection>,
}

/// Партиция мира в памяти
#[derive(Debug, Clone)]
pub struct Partition {
    key: PartitionKey,
    size: i32,
    sections: HashMap<SectionKey, Section>,
}

impl Partition {
    pub fn new(key: PartitionKey, size: i32) -> Self {
        Self {
            key,
            size,
            sections: HashMap::new(),
        }
    }

    pub fn key(&self) -> PartitionKey {
        self.key
    }

    fn check_column(&self, x: i32, z: i32) -> Result<(), WorldError> {
        if !self.key.contains(x, z, self.size) {
            return Err(WorldError::OutOfRange(format!(
                "column ({}, {}) is not in partition {:?}",
                x, z, self.key
            )));
        }
        Ok(())
    }

    /// Блок по абсолютным координатам. Вне сохранённых секций - воздух
    pub fn get(&self, x: i32, y: i32, z: i32) -> Result<Block, WorldError> {
        self.check_column(x, z)?;
        let block = self
            .sections
            .get(&section_key(x, y, z))
            .and_then(|s| s.palette.get(s.indices[section_index(x, y, z)]))
            .cloned()
            .unwrap_or_else(Block::air);
        Ok(block)
    }

    pub fn set(&mut self, block: &Block, x: i32, y: i32, z: i32) -> Result<(), WorldError> {
        self.check_column(x, z)?;
        let section = self
            .sections
            .entry(section_key(x, y, z))
            .or_insert_with(Section::new);
        let idx = section.palette.get_or_insert(block);
        section.indices[section_index(x, y, z)] = idx;
        Ok(())
    }

    /// Сохранить партицию в файл
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // 1. Заголовок
        let header = RegionHeader::new(self.key, self.size);
        let header_bytes = bincode::serialize(&header)
            .map_err(|e| WorldError::Serialize(e.to_string()))?;
        writer.write_all(&header_bytes)?;

        // 2. Секции, детерминированный порядок
        let mut keys: Vec<&SectionKey> = self.sections.keys().collect();
        keys.sort();
        let mut sections = Vec::new();
        for key in keys {
            let section = &self.sections[key];
            if section.is_air_only() {
                continue;
            }
            let bits = section.palette.bits_per_index();
            sections.push(SavedSection {
                sx: key.0,
                sy: key.1,
                sz: key.2,
                palette: section.palette.blocks().to_vec(),
                data: pack_indices(&section.indices, bits),
                bits_per_block: bits,
            });
        }

        // 3. Сериализуем и сжимаем
        let body_bytes = bincode::serialize(&PartitionBody { sections })
            .map_err(|e| WorldError::Serialize(e.to_string()))?;
        let compressed = zstd::encode_all(&body_bytes[..], ZSTD_LEVEL)
            .map_err(|e| WorldError::Compression(e.to_string()))?;
        writer.write_all(&compressed)?;

        writer.flush()?;
        Ok(())
    }

    /// Загрузить партицию из файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        // 1. Заголовок
        let header: RegionHeader = bincode::deserialize_from(&mut reader)
            .map_err(|e| WorldError::Deserialize(e.to_string()))?;
        if !header.is_valid() {
            if header.magic != MAGIC_NUMBER {
                return Err(WorldError::InvalidMagic);
            }
            return Err(WorldError::UnsupportedVersion(header.version));
        }

        // 2. Тело
        let mut compressed = Vec::new();
        reader.read_to_end(&mut compressed)?;
        let body_bytes = zstd::decode_all(&compressed[..])
            .map_err(|e| WorldError::Compression(e.to_string()))?;
        let body: PartitionBody = bincode::deserialize(&body_bytes)
            .map_err(|e| WorldError::Deserialize(e.to_string()))?;

        // 3. Восстанавливаем секции
        let mut partition = Self::new(header.key(), header.partition_size);
        for saved in body.sections {
            if !matches!(saved.bits_per_block, 1 | 2 | 4 | 8 | 16) {
                return Err(WorldError::Deserialize(format!(
                    "invalid bits per block {}",
                    saved.bits_per_block
                )));
            }
            let indices = unpack_indices(&saved.data, saved.bits_per_block);
            if let Some(&bad) = indices.iter().find(|&&i| i as usize >= saved.palette.len()) {
                return Err(WorldError::Deserialize(format!(
                    "palette index {} out of range in section ({}, {}, {})",
                    bad, saved.sx, saved.sy, saved.sz
                )));
            }
            partition.sections.insert(
                (saved.sx, saved.sy, saved.sz),
                Section {
                    palette: BlockPalette::from_blocks(saved.palette),
                    indices,
                },
            );
        }
        Ok(partition)
    }
}

/// Упаковка индексов в байты
fn pack_indices(indices: &[u16], bits: u8) -> Vec<u8> {
    if bits == 16 {
        return indices.iter().flat_map(|i| i.to_le_bytes()).collect();
    }

    let values_per_byte = 8 / bits as usize;
    let total_bytes = (SECTION_VOLUME + values_per_byte - 1) / values_per_byte;
    let mut data = vec![0u8; total_bytes];

    for (i, &idx) in indices.iter().enumerate() {
        let byte_idx = i / values_per_byte;
        let bit_offset = (i % values_per_byte) * bits as usize;
        let mask = ((1u16 << bits) - 1) as u8;
        data[byte_idx] |= (idx as u8 & mask) << bit_offset;
    }

    data
}

/// Распаковка индексов из байтов
fn unpack_indices(data: &[u8], bits: u8) -> Vec<u16> {
    if bits == 16 {
        return (0..SECTION_VOLUME)
            .map(|i| {
                let lo = data.get(2 * i).copied().unwrap_or(0);
                let hi = data.get(2 * i + 1).copied().unwrap_or(0);
                u16::from_le_bytes([lo, hi])
            })
            .collect();
    }

    let values_per_byte = 8 / bits as usize;
    let mask = ((1u16 << bits) - 1) as u8;
    let mut indices = Vec::with_capacity(SECTION_VOLUME);

    for i in 0..SECTION_VOLUME {
        let byte_idx = i / values_per_byte;
        let bit_offset = (i % values_per_byte) * bits as usize;
        let value = (data.get(byte_idx).copied().unwrap_or(0) >> bit_offset) & mask;
        indices.push(value as u16);
    }

    indices
}

/// Директория с файлами партиций: читатель исходного мира и хранилище целевого
pub struct RegionDirectory {
    dir: PathBuf,
    partition_size: i32,
    /// Допустимый диапазон Y [min, max)
    min_y: i32,
    max_y: i32,
    /// Последняя прочитанная партиция
    cached: Option<Partition>,
}

impl RegionDirectory {
    pub fn open(dir: impl Into<PathBuf>, partition_size: i32, min_y: i32, max_y: i32) -> Result<Self, WorldError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            partition_size,
            min_y,
            max_y,
            cached: None,
        })
    }

    fn partition_path(&self, key: PartitionKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Загрузить партицию с диска или создать пустую
    fn load_or_new(&self, key: PartitionKey, partition_size: i32) -> Result<Partition, WorldError> {
        let path = self.partition_path(key);
        if !path.exists() {
            return Ok(Partition::new(key, partition_size));
        }
        let partition = Partition::load(&path)?;
        if partition.key != key || partition.size != partition_size {
            return Err(WorldError::Deserialize(format!(
                "{} holds partition {:?} of size {}, expected {:?} of size {}",
                path.display(),
                partition.key,
                partition.size,
                key,
                partition_size
            )));
        }
        Ok(partition)
    }

    /// Все партиции, которые есть на диске
    pub fn partitions(&self) -> Result<Vec<PartitionKey>, WorldError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            if let Some(key) = name.to_str().and_then(PartitionKey::from_file_name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl WorldReader for RegionDirectory {
    fn block(&mut self, x: i32, y: i32, z: i32) -> Result<Block, WorldError> {
        if y < self.min_y || y >= self.max_y {
            return Err(WorldError::OutOfRange(format!(
                "y={} is outside the world height {}..{}",
                y, self.min_y, self.max_y
            )));
        }
        let key = PartitionKey::containing(x, z, self.partition_size);
        let cached = match self.cached.take() {
            Some(partition) if partition.key == key => partition,
            _ => {
                log::debug!("Loading partition {:?}", key);
                self.load_or_new(key, self.partition_size)?
            }
        };
        let block = cached.get(x, y, z);
        self.cached = Some(cached);
        block
    }
}

impl RegionStore for RegionDirectory {
    type Region = PartitionWriter;

    fn create_region(&mut self, key: PartitionKey, partition_size: i32) -> Result<PartitionWriter, WorldError> {
        // Кэш читателя мог устареть после записи
        self.cached = None;
        Ok(PartitionWriter {
            path: self.partition_path(key),
            partition: self.load_or_new(key, partition_size)?,
            min_y: self.min_y,
            max_y: self.max_y,
        })
    }
}

/// Запись в одну партицию директории
pub struct PartitionWriter {
    path: PathBuf,
    partition: Partition,
    min_y: i32,
    max_y: i32,
}

impl RegionWriter for PartitionWriter {
    fn set_block(&mut self, block: &Block, x: i32, y: i32, z: i32) -> Result<(), WorldError> {
        if y < self.min_y || y >= self.max_y {
            return Err(WorldError::OutOfRange(format!(
                "y={} is outside the world height {}..{}",
                y, self.min_y, self.max_y
            )));
        }
        self.partition.set(block, x, y, z)
    }

    fn save(&mut self) -> Result<(), WorldError> {
        self.partition.save(&self.path)
    }
}
