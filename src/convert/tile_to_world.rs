// ============================================
// Tile -> World - Выгрузка тайлов в мир
// ============================================
// Записи копятся в партициях, партиции создаются лениво и
// сохраняются ровно один раз - после всех тайлов

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::blocks::{Block, BlockMap, BlockRemapper};
use crate::core::{ConvertConfig, ConvertResult, DiagnosticsSink, LogSink};
use crate::tile::{ObjectGroup, ObjectGroupDocument, Tile};
use crate::world::{PartitionKey, RegionStore, RegionWriter};

/// Сохранить раскладку рядом с миром, чтобы обратная конвертация
/// получила те же границы тайлов
pub fn save_layout(dir: impl AsRef<Path>, layout: &ObjectGroupDocument, config: &ConvertConfig) -> ConvertResult<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(&config.layout_file);
    layout.save(&path)?;
    log::info!("Saved layout {} ({} tiles)", path.display(), layout.objects.len());
    Ok(())
}

/// Кэш открытых партиций на время одной конвертации
pub struct PartitionCache<W: RegionStore> {
    partition_size: i32,
    regions: BTreeMap<PartitionKey, W::Region>,
}

impl<W: RegionStore> PartitionCache<W> {
    pub fn new(partition_size: i32) -> Self {
        Self {
            partition_size,
            regions: BTreeMap::new(),
        }
    }

    /// Записать блок, при первом касании открыв его партицию
    pub fn write(&mut self, store: &mut W, block: &Block, x: i32, y: i32, z: i32) -> ConvertResult<()> {
        let key = PartitionKey::containing(x, z, self.partition_size);
        let region = match self.regions.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                log::debug!("Opening partition {}", key.file_name());
                entry.insert(store.create_region(key, self.partition_size)?)
            }
        };
        region.set_block(block, x, y, z)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Сохранить все тронутые партиции. Кэш поглощается
    pub fn flush(self) -> ConvertResult<usize> {
        let count = self.regions.len();
        for (key, mut region) in self.regions {
            region.save()?;
            log::debug!("Saved partition {}", key.file_name());
        }
        Ok(count)
    }
}

/// Блоки-маркеры, разобранные один раз на прогон
struct MarkerBlocks {
    boundary: Block,
    door: Block,
    player_start: Block,
}

impl MarkerBlocks {
    fn from_config(config: &ConvertConfig) -> Self {
        Self {
            boundary: Block::parse(&config.boundary_block),
            door: Block::parse(&config.door_block),
            player_start: Block::parse(&config.player_start_block),
        }
    }
}

pub struct TileToWorldConverter<M: BlockMap, S: DiagnosticsSink = LogSink> {
    config: ConvertConfig,
    remapper: BlockRemapper<M>,
    sink: S,
    /// Воксели за пределами высоты мира
    skipped: usize,
}

impl<M: BlockMap> TileToWorldConverter<M, LogSink> {
    pub fn new(config: ConvertConfig, map: M) -> ConvertResult<Self> {
        Self::with_sink(config, map, LogSink)
    }
}

impl<M: BlockMap, S: DiagnosticsSink> TileToWorldConverter<M, S> {
    pub fn with_sink(config: ConvertConfig, map: M, sink: S) -> ConvertResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            remapper: BlockRemapper::new(map),
            sink,
            skipped: 0,
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

    /// Сколько вокселей не влезло по высоте мира
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Записать все тайлы в мир. Возвращает раскладку группы
    /// (id/pos/size без вокселей и маркеров) для сохранения рядом с миром.
    pub fn convert<W: RegionStore>(&mut self, group: &ObjectGroup, store: &mut W) -> ConvertResult<ObjectGroupDocument> {
        let markers = MarkerBlocks::from_config(&self.config);
        let mut cache = PartitionCache::<W>::new(self.config.partition_size);

        for tile in &group.tiles {
            self.write_tile(tile, &markers, &mut cache, store)
                .map_err(|e| e.in_tile(&tile.id))?;
        }

        let saved = cache.flush()?;
        log::info!("Wrote {} tiles into {} partitions", group.tiles.len(), saved);
        if self.remapper.unmapped_reverse() > 0 {
            log::warn!(
                "{} voxels had no mapping and were dropped",
                self.remapper.unmapped_reverse()
            );
        }

        Ok(group.layout())
    }

    fn write_tile<W: RegionStore>(
        &mut self,
        tile: &Tile,
        markers: &MarkerBlocks,
        cache: &mut PartitionCache<W>,
        store: &mut W,
    ) -> ConvertResult<()> {
        self.config.check_tile_height(tile.size()[1])?;
        tile.validate_markers()?;

        let [px, py, pz] = tile.pos;
        let skipped_before = self.skipped;

        // Воксели
        for (x, y, z, id, aux) in tile.grid.solid_voxels() {
            let Some(block) = self.remapper.reverse(id, aux, &mut self.sink) else {
                continue;
            };
            self.put(cache, store, &block, px + x as i32, py + y as i32, pz + z as i32)?;
        }

        // Двери: весь объём коробки
        for door in &tile.doors {
            for dx in 0..door.size[0] {
                for dy in 0..door.size[1] {
                    for dz in 0..door.size[2] {
                        self.put(
                            cache,
                            store,
                            &markers.door,
                            px + door.pos[0] + dx,
                            py + door.pos[1] + dy,
                            pz + door.pos[2] + dz,
                        )?;
                    }
                }
            }
        }

        // Границы: вертикальные серии
        for b in &tile.boundaries {
            for dy in 0..b.h as i32 {
                self.put(
                    cache,
                    store,
                    &markers.boundary,
                    px + b.x as i32,
                    py + b.y as i32 + dy,
                    pz + b.z as i32,
                )?;
            }
        }

        // Старт игрока: один блок
        let tag = self.config.player_start_tag.clone();
        for region in tile.regions.iter().filter(|r| r.has_tag(&tag)) {
            self.put(
                cache,
                store,
                &markers.player_start,
                px + region.pos[0],
                py + region.pos[1],
                pz + region.pos[2],
            )?;
        }

        let skipped = self.skipped - skipped_before;
        if skipped > 0 {
            log::debug!("Tile {}: {} voxels outside world height skipped", tile.id, skipped);
        }
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

    /// Запись с отсечением по высоте мира
    fn put<W: RegionStore>(
        &mut self,
        cache: &mut PartitionCache<W>,
        store: &mut W,
        block: &Block,
        x: i32,
        y: i32,
        z: i32,
    ) -> ConvertResult<()> {
        if y < self.config.world_min_y || y >= self.config.world_max_y {
            self.skipped += 1;
            return Ok(());
        }
        cache.write(store, block, x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{BlockTable, MappedBlock};
    use crate::core::{CollectingSink, ConvertError, Diagnostic};
    use crate::tile::{Boundary, Door, Region};
    use crate::world::MemoryWorld;

    fn table() -> BlockTable {
        let mut table = BlockTable::new();
        table.register(Block::parse("minecraft:stone"), MappedBlock::new(1, 0));
        table.register(Block::parse("minecraft:light_gray_wool"), MappedBlock::new(35, 8));
        table
    }

    fn small_partitions() -> ConvertConfig {
        ConvertConfig {
            partition_size: 16,
            ..ConvertConfig::default()
        }
    }

    fn converter(config: ConvertConfig) -> TileToWorldConverter<BlockTable, CollectingSink> {
        TileToWorldConverter::with_sink(config, table(), CollectingSink::new()).unwrap()
    }

    #[test]
    fn test_voxels_and_markers_written() {
        let mut tile = Tile::new("t", [4, 6, 4]).unwrap().with_pos([10, 5, 20]);
        tile.set_block(1, 0, 2, 35, 8).unwrap();
        tile.boundaries.push(Boundary::new(0, 1, 0, 2));
        tile.doors.push(Door::new([2, 3, 0], [2, 1, 1]));
        tile.regions.push(Region::tagged([3, 0, 3], "playerstart"));

        let world = MemoryWorld::new(0, 256);
        let layout = converter(ConvertConfig::default())
            .convert(&ObjectGroup::new(vec![tile]), &mut world.clone())
            .unwrap();

        assert_eq!(world.get(11, 5, 22), Some(Block::parse("minecraft:light_gray_wool")));
        assert_eq!(world.get(10, 6, 20), Some(Block::parse("minecraft:barrier")));
        assert_eq!(world.get(10, 7, 20), Some(Block::parse("minecraft:barrier")));
        assert_eq!(world.get(12, 8, 20), Some(Block::parse("minecraft:dead_tube_coral_block")));
        assert_eq!(world.get(13, 8, 20), Some(Block::parse("minecraft:dead_tube_coral_block")));
        assert_eq!(world.get(13, 5, 23), Some(Block::parse("minecraft:jigsaw")));
        assert_eq!(world.len(), 6);

        assert_eq!(layout.objects.len(), 1);
        assert_eq!(layout.objects[0].pos, Some([10, 5, 20]));
        assert!(layout.objects[0].blocks.is_none());
    }

    #[test]
    fn test_untagged_regions_not_written() {
        let mut tile = Tile::new("t", [2, 2, 2]).unwrap();
        tile.regions.push(Region::tagged([0, 0, 0], "spawner"));
        let world = MemoryWorld::new(0, 256);
        converter(ConvertConfig::default())
            .convert(&ObjectGroup::new(vec![tile]), &mut world.clone())
            .unwrap();
        assert!(world.is_empty());
    }

    #[test]
    fn test_each_partition_saved_once() {
        // Два тайла делят партицию (0,0), второй заходит в (1,0)
        let mut a = Tile::new("a", [4, 1, 4]).unwrap();
        a.set_block(3, 0, 3, 1, 0).unwrap();
        let mut b = Tile::new("b", [8, 1, 1]).unwrap().with_pos([12, 0, 0]);
        b.set_block(0, 0, 0, 1, 0).unwrap();
        b.set_block(7, 0, 0, 1, 0).unwrap();

        let world = MemoryWorld::new(0, 256);
        converter(small_partitions())
            .convert(&ObjectGroup::new(vec![a, b]), &mut world.clone())
            .unwrap();

        assert_eq!(
            world.saved_partitions(),
            vec![PartitionKey::new(0, 0), PartitionKey::new(1, 0)]
        );
        assert_eq!(world.save_count(PartitionKey::new(0, 0)), 1);
        assert_eq!(world.save_count(PartitionKey::new(1, 0)), 1);
        assert_eq!(world.get(19, 0, 0), Some(Block::parse("minecraft:stone")));
    }

    #[test]
    fn test_out_of_world_voxels_skipped() {
        let mut tile = Tile::new("t", [1, 4, 1]).unwrap().with_pos([0, 254, 0]);
        for y in 0..4 {
            tile.set_block(0, y, 0, 1, 0).unwrap();
        }
        let world = MemoryWorld::new(0, 256);
        let mut converter = converter(ConvertConfig::default());
        converter
            .convert(&ObjectGroup::new(vec![tile]), &mut world.clone())
            .unwrap();
        assert_eq!(converter.skipped(), 2);
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_unmapped_target_dropped_with_warning() {
        let mut tile = Tile::new("t", [2, 1, 1]).unwrap();
        tile.set_block(0, 0, 0, 200, 3).unwrap();
        tile.set_block(1, 0, 0, 200, 3).unwrap();
        let world = MemoryWorld::new(0, 256);
        let mut converter = converter(ConvertConfig::default());
        converter
            .convert(&ObjectGroup::new(vec![tile]), &mut world.clone())
            .unwrap();

        assert!(world.is_empty());
        assert_eq!(converter.remapper().unmapped_reverse(), 2);
        assert_eq!(
            converter.into_sink().diagnostics,
            vec![Diagnostic::UnmappedTarget { id: 200, aux: 3 }]
        );
    }

    #[test]
    fn test_invalid_markers_abort_tile() {
        let mut tile = Tile::new("broken", [2, 2, 2]).unwrap();
        tile.doors.push(Door::new([1, 0, 0], [2, 1, 1]));
        let err = converter(ConvertConfig::default())
            .convert(&ObjectGroup::new(vec![tile]), &mut MemoryWorld::new(0, 256))
            .unwrap_err();
        assert!(matches!(err, ConvertError::InTile { ref tile, .. } if tile == "broken"));
    }

    #[test]
    fn test_save_layout_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let world_dir = dir.path().join("world");
        let group = ObjectGroup::new(vec![Tile::new("t", [1, 1, 1]).unwrap()]);
        save_layout(&world_dir, &group.layout(), &ConvertConfig::default()).unwrap();
        let loaded = ObjectGroupDocument::load(world_dir.join("objectgroup.json")).unwrap();
        assert_eq!(loaded, group.layout());
    }
}
