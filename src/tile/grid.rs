// ============================================
// Packed Voxel Grid - Упакованные воксели тайла
// ============================================
// Формат буфера blocks:
// - первые volume байт: ID вокселей, индекс (y*sz + z)*sx + x
// - затем ceil(volume/2) байт: aux по 4 бита, чётный индекс в старшем ниббле
//
// region_plane: один байт на колонку (x, z), индекс z*sx + x

use std::fmt;

use ndshape::{RuntimeShape, Shape};

use crate::core::{ConvertError, ConvertResult};

/// Максимальный aux (4 бита)
pub const MAX_AUX: u8 = 0x0f;

/// Самый верхний Y, который попадает в однобайтовую карту высот
const HEIGHT_PLANE_TOP: u32 = 255;

#[derive(Clone)]
pub struct PackedVoxelGrid {
    /// Размер (sx, sy, sz)
    size: [u32; 3],
    /// Форма для линеаризации, порядок осей [x, z, y]
    shape: RuntimeShape<u32, 3>,
    volume: usize,
    blocks: Vec<u8>,
    region_plane: Vec<u8>,
}

impl PartialEq for PackedVoxelGrid {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size
            && self.blocks == other.blocks
            && self.region_plane == other.region_plane
    }
}

// RuntimeShape не реализует Debug, буферы печатать бессмысленно
impl fmt::Debug for PackedVoxelGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedVoxelGrid")
            .field("size", &self.size)
            .field("volume", &self.volume)
            .field("solid", &self.solid_count())
            .finish()
    }
}

/// Длина буфера blocks для объёма: ceil(volume * 1.5)
#[inline]
pub fn blocks_len(volume: usize) -> usize {
    volume + (volume + 1) / 2
}

impl PackedVoxelGrid {
    /// Пустая сетка (везде воздух)
    pub fn new(size: [u32; 3]) -> ConvertResult<Self> {
        let volume = Self::checked_volume(size)?;
        Ok(Self {
            size,
            shape: RuntimeShape::<u32, 3>::new([size[0], size[2], size[1]]),
            volume,
            blocks: vec![0; blocks_len(volume)],
            region_plane: vec![0; size[0] as usize * size[2] as usize],
        })
    }

    /// Сетка из готовых буферов. Длины должны точно совпадать с размером
    pub fn from_buffers(size: [u32; 3], blocks: Vec<u8>, region_plane: Vec<u8>) -> ConvertResult<Self> {
        let mut grid = Self::new(size)?;
        if blocks.len() != grid.blocks.len() {
            return Err(ConvertError::MalformedDocument(format!(
                "blocks buffer has {} bytes, expected {} for size {:?}",
                blocks.len(),
                grid.blocks.len(),
                size
            )));
        }
        if region_plane.len() != grid.region_plane.len() {
            return Err(ConvertError::MalformedDocument(format!(
                "region plane has {} bytes, expected {} for size {:?}",
                region_plane.len(),
                grid.region_plane.len(),
                size
            )));
        }
        grid.blocks = blocks;
        grid.region_plane = region_plane;
        Ok(grid)
    }

    fn checked_volume(size: [u32; 3]) -> ConvertResult<usize> {
        if size.iter().any(|&s| s == 0 || s > u16::MAX as u32) {
            return Err(ConvertError::InvalidArgument(format!(
                "tile size {:?} must be within 1..={} on every axis",
                size,
                u16::MAX
            )));
        }
        let volume = size[0] as u64 * size[1] as u64 * size[2] as u64;
        if volume > u32::MAX as u64 {
            return Err(ConvertError::InvalidArgument(format!("tile size {:?} is too large", size)));
        }
        Ok(volume as usize)
    }

    #[inline]
    pub fn size(&self) -> [u32; 3] {
        self.size
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.volume
    }

    #[inline]
    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    #[inline]
    pub fn region_plane(&self) -> &[u8] {
        &self.region_plane
    }

    /// Индекс ID вокселя
    #[inline]
    fn index(&self, x: u32, y: u32, z: u32) -> ConvertResult<usize> {
        if x >= self.size[0] || y >= self.size[1] || z >= self.size[2] {
            return Err(ConvertError::OutOfBounds {
                pos: [x as i64, y as i64, z as i64],
                size: self.size,
            });
        }
        Ok(self.shape.linearize([x, z, y]) as usize)
    }

    /// Получить (id, aux) вокселя
    pub fn get(&self, x: u32, y: u32, z: u32) -> ConvertResult<(u8, u8)> {
        let index = self.index(x, y, z)?;
        let packed = self.blocks[self.volume + index / 2];
        let aux = if index % 2 == 0 { packed >> 4 } else { packed & 0x0f };
        Ok((self.blocks[index], aux))
    }

    /// Установить id и aux вокселя. Соседний ниббл не трогается
    pub fn set(&mut self, x: u32, y: u32, z: u32, id: u8, aux: u8) -> ConvertResult<()> {
        if aux > MAX_AUX {
            return Err(ConvertError::InvalidArgument(format!(
                "aux value {} at ({}, {}, {}) does not fit in 4 bits",
                aux, x, y, z
            )));
        }
        let index = self.index(x, y, z)?;
        let aux_index = self.volume + index / 2;

        self.blocks[index] = id;
        self.blocks[aux_index] = if index % 2 == 0 {
            self.blocks[aux_index] & 0x0f | aux << 4
        } else {
            self.blocks[aux_index] & 0xf0 | aux
        };
        Ok(())
    }

    /// Карта высот sx × sz (индекс z*sx + x): самый верхний непустой Y,
    /// у полностью пустой колонки - 0
    pub fn height_map(&self) -> Vec<u32> {
        let [sx, sy, sz] = self.size;
        let top = (sy - 1).min(HEIGHT_PLANE_TOP);
        let mut heights = vec![0u32; sx as usize * sz as usize];

        for z in 0..sz {
            for x in 0..sx {
                for y in (0..=top).rev() {
                    let index = self.shape.linearize([x, z, y]) as usize;
                    if self.blocks[index] != 0 {
                        heights[(z * sx + x) as usize] = y;
                        break;
                    }
                }
            }
        }
        heights
    }

    #[inline]
    fn plane_index(&self, x: u32, z: u32) -> ConvertResult<usize> {
        if x >= self.size[0] || z >= self.size[2] {
            return Err(ConvertError::OutOfBounds {
                pos: [x as i64, 0, z as i64],
                size: self.size,
            });
        }
        Ok((z * self.size[0] + x) as usize)
    }

    /// Значение region plane в колонке
    pub fn region_value(&self, x: u32, z: u32) -> ConvertResult<u8> {
        Ok(self.region_plane[self.plane_index(x, z)?])
    }

    pub fn set_region_value(&mut self, x: u32, z: u32, value: u8) -> ConvertResult<()> {
        let index = self.plane_index(x, z)?;
        self.region_plane[index] = value;
        Ok(())
    }

    /// Количество непустых вокселей
    pub fn solid_count(&self) -> usize {
        self.blocks[..self.volume].iter().filter(|&&id| id != 0).count()
    }

    /// Обход непустых вокселей: (x, y, z, id, aux)
    pub fn solid_voxels(&self) -> impl Iterator<Item = (u32, u32, u32, u8, u8)> + '_ {
        (0..self.volume).filter(move |&i| self.blocks[i] != 0).map(move |i| {
            let [x, z, y] = self.shape.delinearize(i as u32);
            let packed = self.blocks[self.volume + i / 2];
            let aux = if i % 2 == 0 { packed >> 4 } else { packed & 0x0f };
            (x, y, z, self.blocks[i], aux)
        })
    }
}
