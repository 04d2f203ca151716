// ============================================
// Config - Настройки конвертера
// ============================================
// Data-driven: может грузиться из JSON, отсутствующие поля берутся по умолчанию

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{ConvertError, ConvertResult};
use crate::blocks::Block;

/// Имя файла с раскладкой тайлов в директории мира
pub const DEFAULT_LAYOUT_FILE: &str = "objectgroup.json";

/// height-plane хранит один байт на колонку
pub const MAX_HEIGHT_PLANE: u32 = 256;

/// Настройки обоих направлений конвертации
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Блоки, которые считаются пустыми (воздух и его варианты)
    pub air_blocks: Vec<String>,
    /// Маркер невидимой стены
    pub boundary_block: String,
    /// Маркер двери. Блок, который точно не встречается в уровнях
    pub door_block: String,
    /// Маркер точки старта игрока
    pub player_start_block: String,
    /// Тег региона старта игрока
    pub player_start_tag: String,
    /// Максимальная высота тайла
    pub max_tile_height: u32,
    /// Допустимый диапазон Y мира [min, max)
    pub world_min_y: i32,
    pub world_max_y: i32,
    /// Размер партиции (региона) мира по X/Z
    pub partition_size: i32,
    /// Имя файла раскладки в директории мира
    pub layout_file: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            air_blocks: vec![
                "minecraft:air".to_string(),
                "minecraft:cave_air".to_string(),
                "minecraft:void_air".to_string(),
            ],
            boundary_block: "minecraft:barrier".to_string(),
            door_block: "minecraft:dead_tube_coral_block".to_string(),
            player_start_block: "minecraft:jigsaw".to_string(),
            player_start_tag: "playerstart".to_string(),
            max_tile_height: MAX_HEIGHT_PLANE,
            world_min_y: 0,
            world_max_y: 256,
            partition_size: 512,
            layout_file: DEFAULT_LAYOUT_FILE.to_string(),
        }
    }
}

impl ConvertConfig {
    /// Загрузить конфиг из JSON строки
    pub fn from_json(json: &str) -> ConvertResult<Self> {
        let config: ConvertConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Загрузить конфиг из файла
    pub fn load<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Проверка согласованности настроек
    pub fn validate(&self) -> ConvertResult<()> {
        let markers = [
            ("boundary_block", &self.boundary_block),
            ("door_block", &self.door_block),
            ("player_start_block", &self.player_start_block),
        ];
        for (name, id) in markers {
            if id.is_empty() {
                return Err(ConvertError::Config(format!("{} is empty", name)));
            }
            if self.is_air(id) {
                return Err(ConvertError::Config(format!("{} \"{}\" is listed as air", name, id)));
            }
        }
        let boundary = Block::parse(&self.boundary_block).name();
        let door = Block::parse(&self.door_block).name();
        let player_start = Block::parse(&self.player_start_block).name();
        if boundary == door || boundary == player_start || door == player_start {
            return Err(ConvertError::Config("marker blocks must be distinct".to_string()));
        }
        if self.max_tile_height == 0 || self.max_tile_height > MAX_HEIGHT_PLANE {
            return Err(ConvertError::Config(format!(
                "max_tile_height must be in 1..={}, got {}",
                MAX_HEIGHT_PLANE, self.max_tile_height
            )));
        }
        if self.world_min_y >= self.world_max_y {
            return Err(ConvertError::Config(format!(
                "empty world height range {}..{}",
                self.world_min_y, self.world_max_y
            )));
        }
        if self.partition_size <= 0 {
            return Err(ConvertError::Config(format!(
                "partition_size must be positive, got {}",
                self.partition_size
            )));
        }
        Ok(())
    }

    /// Пустой ли блок. Имя без namespace считается "minecraft:"
    pub fn is_air(&self, name: &str) -> bool {
        let block = Block::parse(name);
        self.air_blocks.iter().any(|a| block.is(a))
    }

    /// Тайлы выше лимита - ошибка конфигурации, а не тихое обрезание
    pub fn check_tile_height(&self, height: u32) -> ConvertResult<()> {
        if height > self.max_tile_height {
            return Err(ConvertError::Config(format!(
                "tile height {} exceeds max_tile_height {}",
                height, self.max_tile_height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConvertConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_air("minecraft:cave_air"));
        assert!(!config.is_air("minecraft:stone"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ConvertConfig::from_json(r#"{ "partition_size": 256 }"#).unwrap();
        assert_eq!(config.partition_size, 256);
        assert_eq!(config.boundary_block, "minecraft:barrier");
    }

    #[test]
    fn test_rejects_tall_cap_and_duplicate_markers() {
        assert!(matches!(
            ConvertConfig::from_json(r#"{ "max_tile_height": 300 }"#),
            Err(ConvertError::Config(_))
        ));
        assert!(matches!(
            ConvertConfig::from_json(r#"{ "door_block": "minecraft:barrier" }"#),
            Err(ConvertError::Config(_))
        ));
    }

    #[test]
    fn test_markers_compared_with_namespace() {
        assert!(matches!(
            ConvertConfig::from_json(r#"{ "door_block": "barrier" }"#),
            Err(ConvertError::Config(_))
        ));
        assert!(matches!(
            ConvertConfig::from_json(r#"{ "player_start_block": "air" }"#),
            Err(ConvertError::Config(_))
        ));

        let config = ConvertConfig {
            air_blocks: vec!["cave_air".to_string()],
            ..Default::default()
        };
        assert!(config.is_air("minecraft:cave_air"));
        assert!(config.is_air("cave_air"));
    }

    #[test]
    fn test_tile_height_check() {
        let config = ConvertConfig {
            max_tile_height: 64,
            ..Default::default()
        };
        assert!(config.check_tile_height(64).is_ok());
        assert!(matches!(config.check_tile_height(65), Err(ConvertError::Config(_))));
    }
}
