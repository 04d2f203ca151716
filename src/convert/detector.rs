// ============================================
// Marker Detector - Поиск маркеров в исходном мире
// ============================================
// Всё работает за один проход по тайлу в порядке x -> z -> y:
// - границы: вертикальные серии барьеров в одной колонке
// - двери: коробки, выращенные из первого найденного угла
// - старт игрока: одиночный блок -> регион 1x1x1

use crate::blocks::Block;
use crate::core::ConvertConfig;
use crate::tile::{Boundary, Door, Region};

/// Тип маркера. Порядок проверки фиксирован
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    PlayerStart,
    Boundary,
    Door,
}

impl MarkerKind {
    /// Является ли блок маркером (старт игрока, граница, дверь - именно в таком порядке)
    pub fn classify(block: &Block, config: &ConvertConfig) -> Option<Self> {
        if block.is(&config.player_start_block) {
            Some(MarkerKind::PlayerStart)
        } else if block.is(&config.boundary_block) {
            Some(MarkerKind::Boundary)
        } else if block.is(&config.door_block) {
            Some(MarkerKind::Door)
        } else {
            None
        }
    }
}

/// Склейка вертикальных серий границ
#[derive(Debug, Default)]
pub struct BoundaryTracker {
    boundaries: Vec<Boundary>,
    /// Последняя граница в текущей колонке
    current: Option<usize>,
}

impl BoundaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Новая колонка: границы разных колонок никогда не склеиваются
    pub fn start_column(&mut self) {
        self.current = None;
    }

    /// Маркер границы в локальных координатах тайла
    pub fn mark(&mut self, x: u16, y: u16, z: u16) {
        if let Some(i) = self.current {
            let b = &mut self.boundaries[i];
            if b.y as u32 + b.h as u32 == y as u32 {
                b.h += 1;
                return;
            }
        }
        self.boundaries.push(Boundary::new(x, y, z, 1));
        self.current = Some(self.boundaries.len() - 1);
    }

    pub fn finish(self) -> Vec<Boundary> {
        self.boundaries
    }
}

/// Коробка двери в абсолютных координатах, границы включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorBox {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl DoorBox {
    pub fn contains(&self, p: [i32; 3]) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }
}

/// Детектор дверей.
///
/// Каждая ось пробуется независимо от затравочного вокселя, поэтому
/// найденная коробка всегда растёт из первого встреченного угла маркера.
/// Невыпуклые маркеры дают коробку меньше реальной области - это
/// известное приближение, а не баг.
#[derive(Debug, Default)]
pub struct DoorDetector {
    boxes: Vec<DoorBox>,
}

impl DoorDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Воксель уже входит в найденную дверь
    pub fn is_known(&self, p: [i32; 3]) -> bool {
        self.boxes.iter().any(|b| b.contains(p))
    }

    /// Вырастить коробку из seed. `bound` - исключительная верхняя граница тайла
    /// по каждой оси, `is_marker` проверяет блок по абсолютным координатам.
    /// Возвращает true, если добавлена новая дверь.
    pub fn grow<E, F>(&mut self, seed: [i32; 3], bound: [i32; 3], mut is_marker: F) -> Result<bool, E>
    where
        F: FnMut([i32; 3]) -> Result<bool, E>,
    {
        if self.is_known(seed) {
            return Ok(false);
        }

        let mut max = seed;
        for axis in 0..3 {
            let mut probe = seed;
            for c in seed[axis] + 1..bound[axis] {
                probe[axis] = c;
                if !is_marker(probe)? {
                    break;
                }
                max[axis] = c;
            }
        }

        self.boxes.push(DoorBox { min: seed, max });
        Ok(true)
    }

    pub fn boxes(&self) -> &[DoorBox] {
        &self.boxes
    }

    /// Перевести коробки в двери с локальными координатами тайла
    pub fn into_doors(self, origin: [i32; 3]) -> Vec<Door> {
        self.boxes
            .into_iter()
            .map(|b| {
                Door::new(
                    [b.min[0] - origin[0], b.min[1] - origin[1], b.min[2] - origin[2]],
                    [b.max[0] - b.min[0] + 1, b.max[1] - b.min[1] + 1, b.max[2] - b.min[2] + 1],
                )
            })
            .collect()
    }
}

/// Регион старта игрока в локальных координатах
pub fn player_start(x: u32, y: u32, z: u32, tag: &str) -> Region {
    Region::tagged([x as i32, y as i32, z as i32], tag)
}
