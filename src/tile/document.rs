// ============================================
// Tile Document - JSON представление object group
// ============================================
// Буферы (blocks, region-plane, height-plane, boundaries) сжаты zlib
// и закодированы base64. Раскладка тайлов - тот же документ без буферов.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::codec::{compress, decompress};
use super::grid::PackedVoxelGrid;
use super::markers::{decode_boundaries, encode_boundaries, Door, Region};
use super::object::Tile;
use super::pretty;
use crate::core::{ConvertError, ConvertResult};

/// Тайл в документе
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<[i32; 3]>,
    pub size: [u32; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<String>,
    #[serde(default, rename = "region-plane", skip_serializing_if = "Option::is_none")]
    pub region_plane: Option<String>,
    #[serde(default, rename = "height-plane", skip_serializing_if = "Option::is_none")]
    pub height_plane: Option<String>,
    #[serde(default, rename = "region-y-plane", skip_serializing_if = "Option::is_none")]
    pub region_y_plane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundaries: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doors: Option<Vec<Door>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<Vec<Region>>,
}

impl TileDocument {
    /// Только раскладка: id, позиция, размер
    pub fn layout(id: impl Into<String>, pos: [i32; 3], size: [u32; 3]) -> Self {
        Self {
            id: id.into(),
            pos: Some(pos),
            size,
            blocks: None,
            region_plane: None,
            height_plane: None,
            region_y_plane: None,
            boundaries: None,
            y: None,
            doors: None,
            regions: None,
        }
    }

    /// Убрать все поля вокселей и маркеров
    pub fn stripped(&self) -> Self {
        let mut layout = Self::layout(self.id.clone(), self.pos.unwrap_or([0, 0, 0]), self.size);
        layout.y = self.y;
        layout
    }
}

/// Документ object group: { "objects": [...] }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectGroupDocument {
    pub objects: Vec<TileDocument>,
}

impl ObjectGroupDocument {
    pub fn from_json(json: &str) -> ConvertResult<Self> {
        serde_json::from_str(json).map_err(|e| ConvertError::MalformedDocument(e.to_string()))
    }

    /// Компактный pretty JSON
    pub fn to_json(&self) -> ConvertResult<String> {
        let value = serde_json::to_value(self)?;
        Ok(pretty::to_string(&value))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConvertResult<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Раскладка без буферов и маркеров
    pub fn stripped(&self) -> Self {
        Self {
            objects: self.objects.iter().map(TileDocument::stripped).collect(),
        }
    }
}

impl Tile {
    /// Собрать тайл из документа. Отсутствующие буферы - пустые
    pub fn from_document(doc: &TileDocument) -> ConvertResult<Tile> {
        let size = doc.size;
        let empty = PackedVoxelGrid::new(size)?;

        let blocks = match &doc.blocks {
            Some(text) => decompress(text)?,
            None => empty.blocks().to_vec(),
        };
        let region_plane = match &doc.region_plane {
            Some(text) => decompress(text)?,
            None => empty.region_plane().to_vec(),
        };
        let boundaries = match &doc.boundaries {
            Some(text) => decode_boundaries(&decompress(text)?)?,
            None => Vec::new(),
        };

        let tile = Tile {
            id: doc.id.clone(),
            pos: doc.pos.unwrap_or([0, 0, 0]),
            y: doc.y.unwrap_or(0),
            grid: PackedVoxelGrid::from_buffers(size, blocks, region_plane)?,
            boundaries,
            doors: doc.doors.clone().unwrap_or_default(),
            regions: doc.regions.clone().unwrap_or_default(),
        };
        tile.validate_markers().map_err(|e| e.in_tile(&tile.id))?;
        Ok(tile)
    }

    /// Документ тайла. Карта высот пересчитывается здесь
    pub fn to_document(&self) -> ConvertResult<TileDocument> {
        let heights: Vec<u8> = self
            .height_map()
            .into_iter()
            .map(|h| u8::try_from(h).unwrap_or(u8::MAX))
            .collect();
        let height_plane = compress(&heights)?;

        let boundaries = if self.boundaries.is_empty() {
            None
        } else {
            Some(compress(&encode_boundaries(&self.boundaries))?)
        };

        Ok(TileDocument {
            id: self.id.clone(),
            pos: Some(self.pos),
            size: self.size(),
            blocks: Some(compress(self.grid.blocks())?),
            region_plane: Some(compress(self.grid.region_plane())?),
            region_y_plane: Some(height_plane.clone()),
            height_plane: Some(height_plane),
            boundaries,
            y: if self.y != 0 { Some(self.y) } else { None },
            doors: if self.doors.is_empty() { None } else { Some(self.doors.clone()) },
            regions: if self.regions.is_empty() { None } else { Some(self.regions.clone()) },
        })
    }
}

/// Упорядоченный набор тайлов
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectGroup {
    pub tiles: Vec<Tile>,
}

impl ObjectGroup {
    pub fn new(tiles: Vec<Tile>) -> Self {
        Self { tiles }
    }

    pub fn from_document(doc: &ObjectGroupDocument) -> ConvertResult<Self> {
        let tiles = doc
            .objects
            .iter()
            .map(Tile::from_document)
            .collect::<ConvertResult<Vec<_>>>()?;
        Ok(Self { tiles })
    }

    pub fn to_document(&self) -> ConvertResult<ObjectGroupDocument> {
        let objects = self
            .tiles
            .iter()
            .map(|t| t.to_document().map_err(|e| e.in_tile(&t.id)))
            .collect::<ConvertResult<Vec<_>>>()?;
        Ok(ObjectGroupDocument { objects })
    }

    /// Раскладка: id, позиция и размер каждого тайла
    pub fn layout(&self) -> ObjectGroupDocument {
        ObjectGroupDocument {
            objects: self
                .tiles
                .iter()
                .map(|t| {
                    let mut doc = TileDocument::layout(t.id.clone(), t.pos, t.size());
                    doc.y = if t.y != 0 { Some(t.y) } else { None };
                    doc
                })
                .collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> ConvertResult<Self> {
        Self::from_document(&ObjectGroupDocument::load(path)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConvertResult<()> {
        self.to_document()?.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Boundary, Door, Region};

    const SAMPLE_GROUP: &str = r#"{
        "objects": [{
            "id": "sample_tile_01",
            "pos": [36, 12, 46],
            "size": [7, 3, 7],
            "blocks": "eNpTViYVMIAALan28vKO8vIKTIqBgaOBgYF4qgEAohseFg==",
            "region-plane": "eNpjYCARAAAAMQAB",
            "doors": [
                {"pos": [1, 1, 0], "size": [5, 1, 1]},
                {"pos": [1, 1, 6], "size": [5, 1, 1]}
            ]
        }]
    }"#;

    #[test]
    fn test_load_sample_tile() {
        let group = ObjectGroup::from_document(&ObjectGroupDocument::from_json(SAMPLE_GROUP).unwrap()).unwrap();
        let tile = &group.tiles[0];
        assert_eq!(tile.pos, [36, 12, 46]);
        assert_eq!(tile.get_block(0, 2, 4).unwrap(), (35, 8));
        assert_eq!(tile.doors.len(), 2);
        assert!(tile.boundaries.is_empty());
    }

    #[test]
    fn test_document_back_and_forth() {
        let mut tile = Tile::new("room", [3, 4, 2]).unwrap().with_pos([10, 0, -5]);
        tile.set_block(2, 3, 1, 200, 15).unwrap();
        tile.set_block(0, 1, 0, 4, 3).unwrap();
        tile.grid.set_region_value(2, 1, 4).unwrap();
        tile.boundaries.push(Boundary::new(1, 0, 1, 4));
        let mut door = Door::new([0, 0, 0], [1, 2, 1]);
        door.name = Some("west".into());
        tile.doors.push(door);
        tile.regions.push(Region::tagged([1, 1, 0], "playerstart"));
        tile.y = 7;

        let doc = tile.to_document().unwrap();
        assert_eq!(doc.height_plane, doc.region_y_plane);
        assert_eq!(decompress(doc.height_plane.as_deref().unwrap()).unwrap(), vec![1, 0, 0, 0, 0, 3]);

        let back = Tile::from_document(&doc).unwrap();
        assert_eq!(back, tile);
    }

    #[test]
    fn test_random_grid_through_document() {
        use rand::{Rng, SeedableRng};

        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let size = [9, 5, 7];
        let mut tile = Tile::new("random", size).unwrap();
        let mut expected = Vec::new();
        for y in 0..size[1] {
            for z in 0..size[2] {
                for x in 0..size[0] {
                    let id = rng.gen_range(1..=255u8);
                    let aux = rng.gen_range(0..=15u8);
                    tile.set_block(x, y, z, id, aux).unwrap();
                    expected.push((x, y, z, id, aux));
                }
            }
        }
        for z in 0..size[2] {
            for x in 0..size[0] {
                tile.grid.set_region_value(x, z, rng.gen()).unwrap();
            }
        }

        let json = ObjectGroup::new(vec![tile.clone()]).to_document().unwrap().to_json().unwrap();
        let back = ObjectGroup::from_document(&ObjectGroupDocument::from_json(&json).unwrap()).unwrap();
        let back = &back.tiles[0];

        for (x, y, z, id, aux) in expected {
            assert_eq!(back.get_block(x, y, z).unwrap(), (id, aux), "voxel ({}, {}, {})", x, y, z);
        }
        assert_eq!(back.grid.region_plane(), tile.grid.region_plane());
        assert_eq!(back.grid.blocks(), tile.grid.blocks());
    }

    #[test]
    fn test_optional_fields_omitted() {
        let tile = Tile::new("plain", [1, 1, 1]).unwrap();
        let json = serde_json::to_string(&tile.to_document().unwrap()).unwrap();
        assert!(!json.contains("boundaries"));
        assert!(!json.contains("doors"));
        assert!(!json.contains("\"y\""));
        assert!(json.starts_with(r#"{"id":"plain","pos":[0,0,0],"size":[1,1,1],"blocks":"#));
    }

    #[test]
    fn test_layout_is_stripped() {
        let mut tile = Tile::new("a", [2, 2, 2]).unwrap().with_pos([5, 6, 7]);
        tile.set_block(0, 0, 0, 1, 0).unwrap();
        tile.doors.push(Door::new([0, 0, 0], [1, 1, 1]));
        let group = ObjectGroup::new(vec![tile]);

        let layout = group.layout();
        assert_eq!(layout.objects, vec![TileDocument::layout("a", [5, 6, 7], [2, 2, 2])]);
        assert_eq!(group.to_document().unwrap().stripped(), layout);

        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(json, r#"{"objects":[{"id":"a","pos":[5,6,7],"size":[2,2,2]}]}"#);
    }

    #[test]
    fn test_buffer_length_mismatch_is_malformed() {
        let mut doc = Tile::new("a", [2, 2, 2]).unwrap().to_document().unwrap();
        doc.blocks = Some(compress(&[0u8; 5]).unwrap());
        assert!(matches!(Tile::from_document(&doc), Err(ConvertError::MalformedDocument(_))));
    }

    #[test]
    fn test_missing_size_is_malformed() {
        assert!(matches!(
            ObjectGroupDocument::from_json(r#"{ "objects": [ { "id": "a" } ] }"#),
            Err(ConvertError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objectgroup.json");
        let mut tile = Tile::new("saved", [2, 3, 2]).unwrap();
        tile.set_block(1, 2, 1, 9, 9).unwrap();
        let group = ObjectGroup::new(vec![tile]);

        group.save(&path).unwrap();
        assert_eq!(ObjectGroup::load(&path).unwrap(), group);
    }
}
