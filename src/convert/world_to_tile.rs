// ============================================
// World -> Tile - Сборка тайлов из мира
// ============================================
// Раскладка (id/pos/size) берётся из objectgroup.json в директории мира,
// каждый тайл сканируется колонками x -> z -> y

use std::path::Path;

use super::detector::{player_start, BoundaryTracker, DoorDetector, MarkerKind};
use crate::blocks::{BlockMap, BlockRemapper};
use crate::core::{ConvertConfig, ConvertResult, DiagnosticsSink, LogSink};
use crate::tile::{ObjectGroup, ObjectGroupDocument, Tile};
use crate::world::WorldReader;

/// Загрузить раскладку тайлов. Без неё границы тайлов неизвестны - ошибка фатальна
pub fn load_layout(dir: impl AsRef<Path>, config: &ConvertConfig) -> ConvertResult<ObjectGroup> {
    let path = dir.as_ref().join(&config.layout_file);
    let doc = ObjectGroupDocument::load(&path)?;
    log::info!("Loaded layout {} ({} tiles)", path.display(), doc.objects.len());
    ObjectGroup::from_document(&doc.stripped())
}

pub struct WorldToTileConverter<M: BlockMap, S: DiagnosticsSink = LogSink> {
    config: ConvertConfig,
    remapper: BlockRemapper<M>,
    sink: S,
}

impl<M: BlockMap> WorldToTileConverter<M, LogSink> {
    pub fn new(config: ConvertConfig, map: M) -> ConvertResult<Self> {
        Self::with_sink(config, map, LogSink)
    }
}

impl<M: BlockMap, S: DiagnosticsSink> WorldToTileConverter<M, S> {
    pub fn with_sink(config: ConvertConfig, map: M, sink: S) -> ConvertResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            remapper: BlockRemapper::new(map),
            sink,
        })
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    pub fn remapper(&self) -> &BlockRemapper<M> {
        &self.remapper
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Заполнить все тайлы группы. Первая фатальная ошибка прерывает прогон
    pub fn convert<R: WorldReader>(&mut self, reader: &mut R, group: &mut ObjectGroup) -> ConvertResult<()> {
        for tile in &mut group.tiles {
            self.convert_tile(reader, tile)?;
        }
        if self.remapper.unmapped_forward() > 0 {
            log::warn!(
                "{} voxels had no mapping and were left as air",
                self.remapper.unmapped_forward()
            );
        }
        Ok(())
    }

    /// Заполнить один тайл по его позиции и размеру.
    /// Старое содержимое тайла (воксели и маркеры) сбрасывается.
    pub fn convert_tile<R: WorldReader>(&mut self, reader: &mut R, tile: &mut Tile) -> ConvertResult<()> {
        self.scan_tile(reader, tile).map_err(|e| e.in_tile(&tile.id))
    }

    fn scan_tile<R: WorldReader>(&mut self, reader: &mut R, tile: &mut Tile) -> ConvertResult<()> {
        let [sx, sy, sz] = tile.size();
        self.config.check_tile_height(sy)?;
        tile.resize(sx, sy, sz)?;

        let origin = tile.pos;
        let bound = [
            origin[0] + sx as i32,
            origin[1] + sy as i32,
            origin[2] + sz as i32,
        ];

        let mut boundaries = BoundaryTracker::new();
        let mut doors = DoorDetector::new();
        let mut regions = Vec::new();

        for tx in 0..sx {
            let ax = origin[0] + tx as i32;
            for tz in 0..sz {
                let az = origin[2] + tz as i32;
                boundaries.start_column();

                for ty in 0..sy {
                    let ay = origin[1] + ty as i32;
                    let block = reader.block(ax, ay, az)?;

                    if self.config.air_blocks.iter().any(|a| block.is(a)) {
                        continue;
                    }

                    match MarkerKind::classify(&block, &self.config) {
                        Some(MarkerKind::PlayerStart) => {
                            regions.push(player_start(tx, ty, tz, &self.config.player_start_tag));
                        }
                        Some(MarkerKind::Boundary) => {
                            boundaries.mark(tx as u16, ty as u16, tz as u16);
                        }
                        Some(MarkerKind::Door) => {
                            let door_block = &self.config.door_block;
                            doors.grow([ax, ay, az], bound, |p| {
                                reader.block(p[0], p[1], p[2]).map(|b| b.is(door_block))
                            })?;
                        }
                        None => {
                            if let Some(mapped) = self.remapper.forward(&block, &mut self.sink) {
                                tile.set_block(tx, ty, tz, mapped.id, mapped.aux)?;
                            }
                        }
                    }
                }
            }
        }

        tile.boundaries = boundaries.finish();
        tile.doors = doors.into_doors(origin);
        tile.regions = regions;

        log::info!(
            "Tile {} {:?}: {} voxels, {} boundaries, {} doors, {} regions",
            tile.id,
            tile.size(),
            tile.grid.solid_count(),
            tile.boundaries.len(),
            tile.doors.len(),
            tile.regions.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, BlockTable, MappedBlock};
    use crate::core::{CollectingSink, ConvertError, Diagnostic};
    use crate::tile::{Boundary, Door, Region};
    use crate::world::MemoryWorld;

    fn table() -> BlockTable {
        let mut table = BlockTable::new();
        table.register(Block::parse("minecraft:stone"), MappedBlock::new(1, 0));
        table.register(Block::parse("minecraft:light_gray_wool"), MappedBlock::new(35, 8));
        table
    }

    fn converter() -> WorldToTileConverter<BlockTable, CollectingSink> {
        WorldToTileConverter::with_sink(ConvertConfig::default(), table(), CollectingSink::new()).unwrap()
    }

    #[test]
    fn test_voxels_relative_to_tile_pos() {
        let world = MemoryWorld::new(0, 256);
        world.put(Block::parse("minecraft:light_gray_wool"), 100, 12, -4);
        world.put(Block::parse("minecraft:stone"), 101, 10, -5);

        let mut tile = Tile::new("t", [3, 4, 3]).unwrap().with_pos([100, 10, -5]);
        let mut converter = converter();
        converter.convert_tile(&mut world.clone(), &mut tile).unwrap();

        assert_eq!(tile.get_block(0, 2, 1).unwrap(), (35, 8));
        assert_eq!(tile.get_block(1, 0, 0).unwrap(), (1, 0));
        assert_eq!(tile.grid.solid_count(), 2);
        assert!(converter.sink().is_empty());
    }

    #[test]
    fn test_boundary_runs() {
        let world = MemoryWorld::new(0, 256);
        for y in [2, 3, 4, 7] {
            world.put(Block::parse("minecraft:barrier"), 1, y, 1);
        }
        let mut tile = Tile::new("t", [2, 8, 2]).unwrap();
        converter().convert_tile(&mut world.clone(), &mut tile).unwrap();

        assert_eq!(tile.boundaries, vec![Boundary::new(1, 2, 1, 3), Boundary::new(1, 7, 1, 1)]);
        // Маркеры не попадают в воксели
        assert_eq!(tile.grid.solid_count(), 0);
    }

    #[test]
    fn test_door_detected_once() {
        let world = MemoryWorld::new(0, 256);
        for x in 1..4 {
            for z in 0..2 {
                world.put(Block::parse("minecraft:dead_tube_coral_block"), x, 3, z);
            }
        }
        let mut tile = Tile::new("t", [5, 5, 5]).unwrap();
        let mut converter = converter();
        converter.convert_tile(&mut world.clone(), &mut tile).unwrap();
        assert_eq!(tile.doors, vec![Door::new([1, 3, 0], [3, 1, 2])]);

        // Повторный прогон сбрасывает тайл и даёт тот же результат
        converter.convert_tile(&mut world.clone(), &mut tile).unwrap();
        assert_eq!(tile.doors.len(), 1);
    }

    #[test]
    fn test_player_start_region() {
        let world = MemoryWorld::new(0, 256);
        world.put(Block::parse("minecraft:jigsaw"), 6, 1, 7);
        let mut tile = Tile::new("t", [4, 4, 4]).unwrap().with_pos([4, 0, 4]);
        converter().convert_tile(&mut world.clone(), &mut tile).unwrap();
        assert_eq!(tile.regions, vec![Region::tagged([2, 1, 3], "playerstart")]);
    }

    #[test]
    fn test_unmapped_becomes_air_with_single_warning() {
        let world = MemoryWorld::new(0, 256);
        let glowstone = Block::parse("minecraft:glowstone");
        world.put(glowstone.clone(), 0, 0, 0);
        world.put(glowstone.clone(), 1, 1, 1);
        world.put(Block::parse("minecraft:cave_air"), 1, 0, 1);

        let mut tile = Tile::new("t", [2, 2, 2]).unwrap();
        let mut converter = converter();
        converter.convert_tile(&mut world.clone(), &mut tile).unwrap();

        assert_eq!(tile.grid.solid_count(), 0);
        assert_eq!(converter.remapper().unmapped_forward(), 2);
        let sink = converter.into_sink();
        assert_eq!(sink.diagnostics, vec![Diagnostic::UnmappedSource { block: glowstone }]);
    }

    #[test]
    fn test_reader_error_names_tile() {
        let world = MemoryWorld::new(0, 4);
        let mut tile = Tile::new("tall", [1, 8, 1]).unwrap();
        let err = converter().convert_tile(&mut world.clone(), &mut tile).unwrap_err();
        match err {
            ConvertError::InTile { tile, source } => {
                assert_eq!(tile, "tall");
                assert!(matches!(*source, ConvertError::Collaborator(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_tile_taller_than_cap_is_config_error() {
        let config = ConvertConfig {
            max_tile_height: 16,
            ..ConvertConfig::default()
        };
        let mut converter = WorldToTileConverter::with_sink(config, table(), CollectingSink::new()).unwrap();
        let mut tile = Tile::new("t", [1, 17, 1]).unwrap();
        let err = converter
            .convert_tile(&mut MemoryWorld::new(0, 256), &mut tile)
            .unwrap_err();
        assert!(matches!(err, ConvertError::InTile { ref source, .. } if matches!(**source, ConvertError::Config(_))));
    }

    #[test]
    fn test_missing_layout_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_layout(dir.path(), &ConvertConfig::default()).is_err());
    }
}
