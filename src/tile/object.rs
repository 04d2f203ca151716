// ============================================
// Tile - Кубоид блоков + маркеры
// ============================================
// Из тайлов собираются уровни. Воксели хранятся упакованно,
// границы/двери/регионы - отдельными списками.

use std::collections::BTreeMap;
use std::fmt;

use super::grid::PackedVoxelGrid;
use super::markers::{Boundary, Door, Region};
use crate::core::{ConvertError, ConvertResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: String,
    /// Позиция в абсолютных координатах мира
    pub pos: [i32; 3],
    /// Вертикальное смещение тайла (в документе только если != 0)
    pub y: i32,
    pub grid: PackedVoxelGrid,
    pub boundaries: Vec<Boundary>,
    pub doors: Vec<Door>,
    pub regions: Vec<Region>,
}

impl Tile {
    pub fn new(id: impl Into<String>, size: [u32; 3]) -> ConvertResult<Self> {
        Ok(Self {
            id: id.into(),
            pos: [0, 0, 0],
            y: 0,
            grid: PackedVoxelGrid::new(size)?,
            boundaries: Vec::new(),
            doors: Vec::new(),
            regions: Vec::new(),
        })
    }

    pub fn with_pos(mut self, pos: [i32; 3]) -> Self {
        self.pos = pos;
        self
    }

    #[inline]
    pub fn size(&self) -> [u32; 3] {
        self.grid.size()
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.grid.volume()
    }

    pub fn get_block(&self, x: u32, y: u32, z: u32) -> ConvertResult<(u8, u8)> {
        self.grid.get(x, y, z)
    }

    pub fn set_block(&mut self, x: u32, y: u32, z: u32, id: u8, aux: u8) -> ConvertResult<()> {
        self.grid.set(x, y, z, id, aux)
    }

    pub fn height_map(&self) -> Vec<u32> {
        self.grid.height_map()
    }

    /// Новый размер. Всё, что зависит от размера, сбрасывается
    pub fn resize(&mut self, x: u32, y: u32, z: u32) -> ConvertResult<()> {
        self.grid = PackedVoxelGrid::new([x, y, z])?;
        self.boundaries.clear();
        self.doors.clear();
        self.regions.clear();
        Ok(())
    }

    /// Пустая копия с тем же id/позицией/размером
    pub fn layout(&self) -> ConvertResult<Tile> {
        let mut layout = Tile::new(self.id.clone(), self.size())?.with_pos(self.pos);
        layout.y = self.y;
        Ok(layout)
    }

    /// Проверка геометрии маркеров относительно размера тайла
    pub fn validate_markers(&self) -> ConvertResult<()> {
        let size = self.size();

        let mut columns: BTreeMap<(u16, u16), Vec<&Boundary>> = BTreeMap::new();
        for b in &self.boundaries {
            if b.h == 0 {
                return Err(ConvertError::InvalidArgument(format!(
                    "boundary at ({}, {}, {}) has zero height",
                    b.x, b.y, b.z
                )));
            }
            if b.x as u32 >= size[0] || b.z as u32 >= size[2] || b.y as u32 + b.h as u32 > size[1] {
                return Err(ConvertError::OutOfBounds {
                    pos: [b.x as i64, b.y as i64 + b.h as i64 - 1, b.z as i64],
                    size,
                });
            }
            columns.entry((b.x, b.z)).or_default().push(b);
        }
        for ((x, z), mut column) in columns {
            column.sort_by_key(|b| b.y);
            for pair in column.windows(2) {
                // Соседние столбцы в одной колонке должны были слиться при детекции
                if pair[0].y as u32 + pair[0].h as u32 >= pair[1].y as u32 {
                    return Err(ConvertError::InvalidArgument(format!(
                        "boundaries in column ({}, {}) overlap or touch at y={}",
                        x, z, pair[1].y
                    )));
                }
            }
        }

        for (i, door) in self.doors.iter().enumerate() {
            check_box("door", door.pos, door.size, size)?;
            // Невыпуклый маркер даёт пересекающиеся коробки, такой тайл остаётся рабочим
            if let Some(other) = self.doors[..i].iter().find(|d| d.overlaps(door)) {
                log::warn!(
                    "Tile {}: door at {:?} overlaps door at {:?}",
                    self.id, door.pos, other.pos
                );
            }
        }

        for region in &self.regions {
            check_box("region", region.pos, region.size, size)?;
        }
        Ok(())
    }

    /// Краткая сводка по тайлу
    pub fn summary(&self) -> TileSummary {
        let mut region_values = BTreeMap::new();
        for &value in self.grid.region_plane() {
            *region_values.entry(value).or_insert(0) += 1;
        }
        TileSummary {
            id: self.id.clone(),
            pos: self.pos,
            size: self.size(),
            solid_voxels: self.grid.solid_count(),
            boundaries: self.boundaries.len(),
            boundary_voxels: self.boundaries.iter().map(|b| b.h as usize).sum(),
            doors: self.doors.len(),
            regions: self.regions.len(),
            region_values,
        }
    }
}

/// Коробка маркера должна лежать внутри тайла и иметь размер >= 1
fn check_box(what: &str, pos: [i32; 3], box_size: [i32; 3], size: [u32; 3]) -> ConvertResult<()> {
    if box_size.iter().any(|&s| s < 1) {
        return Err(ConvertError::InvalidArgument(format!(
            "{} at {:?} has invalid size {:?}",
            what, pos, box_size
        )));
    }
    for axis in 0..3 {
        let end = pos[axis] as i64 + box_size[axis] as i64;
        if pos[axis] < 0 || end > size[axis] as i64 {
            return Err(ConvertError::OutOfBounds {
                pos: [pos[0] as i64, pos[1] as i64, pos[2] as i64],
                size,
            });
        }
    }
    Ok(())
}

/// Статистика тайла для CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSummary {
    pub id: String,
    pub pos: [i32; 3],
    pub size: [u32; 3],
    pub solid_voxels: usize,
    pub boundaries: usize,
    pub boundary_voxels: usize,
    pub doors: usize,
    pub regions: usize,
    /// Значение region plane -> количество колонок
    pub region_values: BTreeMap<u8, usize>,
}

impl fmt::Display for TileSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\"{}\" at {:?}, size {}x{}x{}",
            self.id, self.pos, self.size[0], self.size[1], self.size[2]
        )?;
        writeln!(f, "  solid voxels: {}", self.solid_voxels)?;
        writeln!(f, "  boundaries:   {} ({} voxels)", self.boundaries, self.boundary_voxels)?;
        writeln!(f, "  doors:        {}", self.doors)?;
        writeln!(f, "  regions:      {}", self.regions)?;
        let plane: Vec<String> = self
            .region_values
            .iter()
            .map(|(value, count)| format!("{}: {}", value, count))
            .collect();
        write!(f, "  region plane: {}", plane.join(", "))
    }
}
