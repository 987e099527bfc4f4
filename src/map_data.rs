use crate::layer::LayerData;
use crate::object::ObjectLayer;
use crate::properties::Properties;
use crate::tileset::{ImageCollection, Tileset};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl Orientation {
    /// Unknown strings fall back to orthogonal.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "isometric" => Orientation::Isometric,
            "staggered" => Orientation::Staggered,
            "hexagonal" => Orientation::Hexagonal,
            _ => Orientation::Orthogonal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderOrder {
    #[default]
    RightDown,
    LeftDown,
    RightUp,
    LeftUp,
}

impl RenderOrder {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "right-down" => Some(RenderOrder::RightDown),
            "left-down" => Some(RenderOrder::LeftDown),
            "right-up" => Some(RenderOrder::RightUp),
            "left-up" => Some(RenderOrder::LeftUp),
            _ => None,
        }
    }
}

/// Where a map came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapFormat {
    TiledJson,
    /// Built in code with [`crate::Tilemap::blank`].
    Blank,
}

/// A flattened image layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLayer {
    pub name: String,
    pub image: String,
    pub x: f32,
    pub y: f32,
    pub alpha: f32,
    pub visible: bool,
    pub properties: Properties,
}

/// Where a global tile ID lives: atlas pixel origin and owning tileset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileIndexEntry {
    pub atlas_x: u32,
    pub atlas_y: u32,
    pub tileset_index: usize,
}

/// GID span owned by one tileset plus the atlas geometry to resolve cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TileRange {
    first_gid: u32,
    /// Exclusive.
    end_gid: u64,
    columns: u32,
    margin: u32,
    step_x: u64,
    step_y: u64,
    tileset_index: usize,
}

impl TileRange {
    fn entry(&self, gid: u64) -> Option<TileIndexEntry> {
        if gid < self.first_gid as u64 || gid >= self.end_gid || self.columns == 0 {
            return None;
        }
        let local = gid - self.first_gid as u64;
        let (col, row) = (local % self.columns as u64, local / self.columns as u64);
        let clamp = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        Some(TileIndexEntry {
            atlas_x: clamp(self.margin as u64 + col * self.step_x),
            atlas_y: clamp(self.margin as u64 + row * self.step_y),
            tileset_index: self.tileset_index,
        })
    }
}

/// Global tile index: GID -> atlas cell and tileset.
///
/// Stores one range per tileset keyed by `(first_gid, registration order)`,
/// so memory follows the tileset count rather than the highest GID. Where
/// ranges overlap, the set with the higher `first_gid` wins, then the one
/// registered later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileIndex {
    ranges: BTreeMap<(u32, usize), TileRange>,
}

impl TileIndex {
    /// Index every tileset with at least one tile.
    pub fn from_tilesets(tilesets: &[Tileset]) -> Self {
        let ranges = tilesets
            .iter()
            .enumerate()
            .filter(|(_, ts)| ts.total > 0 && ts.columns > 0)
            .map(|(tileset_index, ts)| {
                let range = TileRange {
                    first_gid: ts.first_gid,
                    end_gid: ts.first_gid as u64 + ts.total as u64,
                    columns: ts.columns,
                    margin: ts.tile_margin,
                    step_x: ts.tile_width as u64 + ts.tile_spacing as u64,
                    step_y: ts.tile_height as u64 + ts.tile_spacing as u64,
                    tileset_index,
                };
                ((ts.first_gid, tileset_index), range)
            })
            .collect();
        TileIndex { ranges }
    }

    pub fn get(&self, gid: i64) -> Option<TileIndexEntry> {
        let gid = u32::try_from(gid).ok()?;
        self.ranges
            .range(..=(gid, usize::MAX))
            .rev()
            .find_map(|(_, range)| range.entry(gid as u64))
    }

    /// Number of indexed tilesets.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Everything parsed out of one map document.
#[derive(Debug, Clone)]
pub struct MapData {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub infinite: bool,
    pub tile_width: f32,
    pub tile_height: f32,
    pub width_in_pixels: f32,
    pub height_in_pixels: f32,
    pub format: MapFormat,
    pub orientation: Orientation,
    pub render_order: RenderOrder,
    pub version: String,
    pub properties: Properties,
    pub layers: Vec<LayerData>,
    pub images: Vec<ImageLayer>,
    pub objects: Vec<ObjectLayer>,
    pub tilesets: Vec<Tileset>,
    pub image_collections: Vec<ImageCollection>,
    /// Global tile index, addressed by GID.
    pub tiles: TileIndex,
    pub hex_side_length: f32,
    pub stagger_axis: String,
    pub stagger_index: String,
}

impl MapData {
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        tile_width: f32,
        tile_height: f32,
        format: MapFormat,
    ) -> Self {
        MapData {
            name: name.into(),
            width,
            height,
            infinite: false,
            tile_width,
            tile_height,
            width_in_pixels: width as f32 * tile_width,
            height_in_pixels: height as f32 * tile_height,
            format,
            orientation: Orientation::Orthogonal,
            render_order: RenderOrder::RightDown,
            version: "1".to_owned(),
            properties: Properties::new(),
            layers: Vec::new(),
            images: Vec::new(),
            objects: Vec::new(),
            tilesets: Vec::new(),
            image_collections: Vec::new(),
            tiles: TileIndex::default(),
            hex_side_length: 0.0,
            stagger_axis: "y".to_owned(),
            stagger_index: "odd".to_owned(),
        }
    }

    /// Tileset and atlas cell for `gid`.
    pub fn tile_index_entry(&self, gid: i64) -> Option<TileIndexEntry> {
        self.tiles.get(gid)
    }
}
