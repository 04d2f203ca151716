// ============================================
// Convert Error - Ошибки конвертации
// ============================================
// UnmappedBlock - единственная восстанавливаемая ошибка,
// всё остальное прерывает обработку тайла.

use std::fmt;

use crate::world::WorldError;

pub type ConvertResult<T> = Result<T, ConvertError>;

/// Ошибки конвертации тайлов
#[derive(Debug)]
pub enum ConvertError {
    /// Блок отсутствует в таблице маппинга
    UnmappedBlock(String),
    /// Координата или индекс вне объявленного размера
    OutOfBounds { pos: [i64; 3], size: [u32; 3] },
    /// Некорректный аргумент (aux > 15, кривая геометрия маркера)
    InvalidArgument(String),
    /// В документе нет обязательных полей или длины буферов не сходятся
    MalformedDocument(String),
    /// Некорректная конфигурация
    Config(String),
    /// Ошибка WorldReader / RegionWriter
    Collaborator(WorldError),
    Io(std::io::Error),
    Json(serde_json::Error),
    /// Фатальная ошибка внутри конкретного тайла
    InTile { tile: String, source: Box<ConvertError> },
}

impl ConvertError {
    /// Обернуть ошибку идентификатором тайла
    pub fn in_tile(self, tile: &str) -> Self {
        match self {
            ConvertError::InTile { .. } => self,
            other => ConvertError::InTile {
                tile: tile.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Восстанавливаемая ли ошибка
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ConvertError::UnmappedBlock(_))
    }
}

impl From<WorldError> for ConvertError {
    fn from(e: WorldError) -> Self {
        ConvertError::Collaborator(e)
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(e: std::io::Error) -> Self {
        ConvertError::Io(e)
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        ConvertError::Json(e)
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::UnmappedBlock(block) => write!(f, "unmapped block: {}", block),
            ConvertError::OutOfBounds { pos, size } => write!(
                f,
                "position ({}, {}, {}) is outside of size {}x{}x{}",
                pos[0], pos[1], pos[2], size[0], size[1], size[2]
            ),
            ConvertError::InvalidArgument(e) => write!(f, "invalid argument: {}", e),
            ConvertError::MalformedDocument(e) => write!(f, "malformed document: {}", e),
            ConvertError::Config(e) => write!(f, "configuration error: {}", e),
            ConvertError::Collaborator(e) => write!(f, "world storage error: {}", e),
            ConvertError::Io(e) => write!(f, "IO error: {}", e),
            ConvertError::Json(e) => write!(f, "JSON error: {}", e),
            ConvertError::InTile { tile, source } => write!(f, "tile \"{}\": {}", tile, source),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Collaborator(e) => Some(e),
            ConvertError::Io(e) => Some(e),
            ConvertError::Json(e) => Some(e),
            ConvertError::InTile { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
