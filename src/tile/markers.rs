// ============================================
// Tile Markers - Границы, двери, регионы
// ============================================

use serde::{Deserialize, Serialize};

use crate::core::{ConvertError, ConvertResult};

/// Граница тайла: столбец невидимых твёрдых блоков.
/// Твёрдые только стенки, верх и низ проходимы.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub x: u16,
    pub y: u16,
    pub z: u16,
    /// Высота столбца, >= 1
    pub h: u16,
}

impl Boundary {
    /// Размер записи в буфере boundaries
    pub const BYTES: usize = 8;

    pub fn new(x: u16, y: u16, z: u16, h: u16) -> Self {
        Self { x, y, z, h }
    }

    /// Четыре big-endian u16: x, y, z, h
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut out = [0u8; Self::BYTES];
        out[0..2].copy_from_slice(&self.x.to_be_bytes());
        out[2..4].copy_from_slice(&self.y.to_be_bytes());
        out[4..6].copy_from_slice(&self.z.to_be_bytes());
        out[6..8].copy_from_slice(&self.h.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; Self::BYTES]) -> Self {
        Self {
            x: u16::from_be_bytes([bytes[0], bytes[1]]),
            y: u16::from_be_bytes([bytes[2], bytes[3]]),
            z: u16::from_be_bytes([bytes[4], bytes[5]]),
            h: u16::from_be_bytes([bytes[6], bytes[7]]),
        }
    }
}

/// Упаковать список границ в буфер
pub fn encode_boundaries(boundaries: &[Boundary]) -> Vec<u8> {
    let mut out = Vec::with_capacity(boundaries.len() * Boundary::BYTES);
    for boundary in boundaries {
        out.extend_from_slice(&boundary.to_bytes());
    }
    out
}

/// Распаковать буфер границ
pub fn decode_boundaries(bytes: &[u8]) -> ConvertResult<Vec<Boundary>> {
    if bytes.len() % Boundary::BYTES != 0 {
        return Err(ConvertError::MalformedDocument(format!(
            "boundaries buffer length {} is not a multiple of {}",
            bytes.len(),
            Boundary::BYTES
        )));
    }
    Ok(bytes
        .chunks_exact(Boundary::BYTES)
        .map(|chunk| {
            let mut entry = [0u8; Boundary::BYTES];
            entry.copy_from_slice(chunk);
            Boundary::from_bytes(&entry)
        })
        .collect())
}

fn unit_size() -> [i32; 3] {
    [1, 1, 1]
}

/// Дверь тайла: соединение тайлов или точка телепорта
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    pub pos: [i32; 3],
    pub size: [i32; 3],
}

impl Door {
    pub fn new(pos: [i32; 3], size: [i32; 3]) -> Self {
        Self { name: None, tags: None, pos, size }
    }

    /// Последняя точка двери (включительно)
    pub fn max(&self) -> [i32; 3] {
        [
            self.pos[0] + self.size[0] - 1,
            self.pos[1] + self.size[1] - 1,
            self.pos[2] + self.size[2] - 1,
        ]
    }

    pub fn overlaps(&self, other: &Door) -> bool {
        let (a, b) = (self.max(), other.max());
        (0..3).all(|axis| self.pos[axis] <= b[axis] && other.pos[axis] <= a[axis])
    }
}

/// Регион тайла: маркер области для триггеров и объектов
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub pos: [i32; 3],
    #[serde(default = "unit_size")]
    pub size: [i32; 3],
}

impl Region {
    pub fn new(pos: [i32; 3], size: [i32; 3]) -> Self {
        Self { name: None, tags: None, kind: None, pos, size }
    }

    /// Одновоксельный регион с тегом
    pub fn tagged(pos: [i32; 3], tag: &str) -> Self {
        Self {
            tags: Some(tag.to_string()),
            ..Self::new(pos, unit_size())
        }
    }

    /// Есть ли тег в списке через запятую
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .map_or(false, |tags| tags.split(',').any(|t| t.trim() == tag))
    }
}
