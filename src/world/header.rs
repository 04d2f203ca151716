// ============================================
// Region Header - Заголовок файла партиции
// ============================================

use serde::{Deserialize, Serialize};

use super::access::PartitionKey;

/// Магическое число "TKRG" в ASCII
pub const MAGIC_NUMBER: [u8; 4] = [0x54, 0x4b, 0x52, 0x47];

/// Версия формата файла партиции
pub const REGION_VERSION: u32 = 1;

/// Заголовок файла партиции
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionHeader {
    /// Магическое число для валидации
    pub magic: [u8; 4],
    /// Версия формата
    pub version: u32,
    /// Координаты партиции
    pub x: i32,
    pub z: i32,
    /// Размер партиции по X/Z
    pub partition_size: i32,
}

impl RegionHeader {
    pub fn new(key: PartitionKey, partition_size: i32) -> Self {
        Self {
            magic: MAGIC_NUMBER,
            version: REGION_VERSION,
            x: key.x,
            z: key.z,
            partition_size,
        }
    }

    pub fn key(&self) -> PartitionKey {
        PartitionKey::new(self.x, self.z)
    }

    /// Проверка валидности заголовка
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC_NUMBER && self.version == REGION_VERSION
    }
}
