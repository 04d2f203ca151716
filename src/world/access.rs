// ============================================
// World Access - Интерфейсы чтения/записи мира
// ============================================

use std::fmt;

use crate::blocks::Block;

/// Позиция блока в абсолютных координатах мира
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Ключ партиции, в которую попадает блок
    pub fn partition_key(&self, partition_size: i32) -> PartitionKey {
        PartitionKey::containing(self.x, self.z, partition_size)
    }
}

/// Ключ партиции мира (по X/Z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub x: i32,
    pub z: i32,
}

impl PartitionKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Партиция, содержащая колонку (x, z). Отрицательные координаты
    /// округляются вниз
    pub fn containing(x: i32, z: i32, partition_size: i32) -> Self {
        Self {
            x: x.div_euclid(partition_size),
            z: z.div_euclid(partition_size),
        }
    }

    /// Имя файла партиции: "r.<x>.<z>.dat"
    pub fn file_name(&self) -> String {
        format!("r.{}.{}.dat", self.x, self.z)
    }

    /// Разобрать имя файла партиции
    pub fn from_file_name(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.len() == 4 && parts[0] == "r" && parts[3] == "dat" {
            let x = parts[1].parse().ok()?;
            let z = parts[2].parse().ok()?;
            Some(Self { x, z })
        } else {
            None
        }
    }

    /// Принадлежит ли колонка этой партиции
    pub fn contains(&self, x: i32, z: i32, partition_size: i32) -> bool {
        Self::containing(x, z, partition_size) == *self
    }
}

/// Ошибки хранилища мира
#[derive(Debug)]
pub enum WorldError {
    Io(std::io::Error),
    Serialize(String),
    Deserialize(String),
    InvalidMagic,
    UnsupportedVersion(u32),
    Compression(String),
    /// Координата вне мира или вне партиции
    OutOfRange(String),
}

impl From<std::io::Error> for WorldError {
    fn from(e: std::io::Error) -> Self {
        WorldError::Io(e)
    }
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::Io(e) => write!(f, "IO error: {}", e),
            WorldError::Serialize(e) => write!(f, "serialize error: {}", e),
            WorldError::Deserialize(e) => write!(f, "deserialize error: {}", e),
            WorldError::InvalidMagic => write!(f, "not a region file (bad magic)"),
            WorldError::UnsupportedVersion(v) => write!(f, "unsupported region file version {}", v),
            WorldError::Compression(e) => write!(f, "compression error: {}", e),
            WorldError::OutOfRange(e) => write!(f, "out of range: {}", e),
        }
    }
}

impl std::error::Error for WorldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorldError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Чтение блоков исходного мира
pub trait WorldReader {
    /// Блок по абсолютным координатам
    fn block(&mut self, x: i32, y: i32, z: i32) -> Result<Block, WorldError>;
}

/// Запись блоков в одну партицию мира
pub trait RegionWriter {
    /// Последняя запись побеждает
    fn set_block(&mut self, block: &Block, x: i32, y: i32, z: i32) -> Result<(), WorldError>;
    /// Сброс в постоянное хранилище. Повторный вызов безопасен
    fn save(&mut self) -> Result<(), WorldError>;
}

/// Фабрика партиций целевого мира
pub trait RegionStore {
    type Region: RegionWriter;

    /// Открыть (или создать) партицию
    fn create_region(&mut self, key: PartitionKey, partition_size: i32) -> Result<Self::Region, WorldError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_key_negative_coords() {
        assert_eq!(PartitionKey::containing(0, 511, 512), PartitionKey::new(0, 0));
        assert_eq!(PartitionKey::containing(512, -1, 512), PartitionKey::new(1, -1));
        assert_eq!(PartitionKey::containing(-512, -513, 512), PartitionKey::new(-1, -2));
        assert_eq!(BlockPos::new(-1, 64, 1024).partition_key(512), PartitionKey::new(-1, 2));
    }

    #[test]
    fn test_file_name() {
        let key = PartitionKey::new(0, -1);
        assert_eq!(key.file_name(), "r.0.-1.dat");
        assert_eq!(PartitionKey::from_file_name("r.0.-1.dat"), Some(key));
        assert_eq!(PartitionKey::from_file_name("r.0.-1.mca"), None);
        assert_eq!(PartitionKey::from_file_name("objectgroup.json"), None);
    }
}
