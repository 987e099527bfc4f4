use crate::map_data::Orientation;
use crate::properties::Properties;
use crate::tile::{CollisionCallback, Tile};
use crate::tilemap_layer::TilemapLayerId;
use std::collections::HashMap;

/// One grid cell: `None` is the null placeholder used when empty cells are not materialised.
pub type Cell = Option<Tile>;

/// One tile layer: geometry plus a row-major `height × width` grid.
#[derive(Debug, Clone)]
pub struct LayerData {
    /// Prefixed with the owning group path.
    pub name: String,
    pub id: u32,
    /// Pixel offset.
    pub x: f32,
    pub y: f32,
    /// In tiles.
    pub width: usize,
    pub height: usize,
    pub tile_width: f32,
    pub tile_height: f32,
    pub base_tile_width: f32,
    pub base_tile_height: f32,
    pub orientation: Orientation,
    pub width_in_pixels: f32,
    pub height_in_pixels: f32,
    pub alpha: f32,
    pub visible: bool,
    pub properties: Properties,
    /// Tile indexes that collide when placed.
    pub collide_indexes: Vec<i32>,
    /// Per-index callbacks, consulted after a tile's own callback.
    pub callbacks: HashMap<i32, CollisionCallback>,
    /// `data[y][x]`.
    pub data: Vec<Vec<Cell>>,
    /// Runtime layer currently attached, if any. Not an owner.
    pub tilemap_layer: Option<TilemapLayerId>,
    pub hex_side_length: f32,
    pub stagger_axis: String,
    pub stagger_index: String,
}

impl LayerData {
    /// An empty layer of the given size; `data` is left for the caller to fill.
    pub fn new(
        name: impl Into<String>,
        width: usize,
        height: usize,
        tile_width: f32,
        tile_height: f32,
    ) -> Self {
        LayerData {
            name: name.into(),
            id: 0,
            x: 0.0,
            y: 0.0,
            width,
            height,
            tile_width,
            tile_height,
            base_tile_width: tile_width,
            base_tile_height: tile_height,
            orientation: Orientation::Orthogonal,
            width_in_pixels: width as f32 * tile_width,
            height_in_pixels: height as f32 * tile_height,
            alpha: 1.0,
            visible: true,
            properties: Properties::new(),
            collide_indexes: Vec::new(),
            callbacks: HashMap::new(),
            data: Vec::new(),
            tilemap_layer: None,
            hex_side_length: 0.0,
            stagger_axis: "y".to_owned(),
            stagger_index: "odd".to_owned(),
        }
    }

    /// Fill `data` with empty cells: nulls, or index `-1` tiles.
    pub fn fill_empty(&mut self, insert_null: bool) {
        let (tw, th) = (self.tile_width, self.tile_height);
        self.data = (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| empty_cell(insert_null, x as i32, y as i32, tw, th))
                    .collect()
            })
            .collect();
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.data.get(y as usize)?.get(x as usize)
    }

    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.data.get_mut(y as usize)?.get_mut(x as usize)
    }

    /// Every materialised tile, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.data.iter().flatten().flatten()
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.data.iter_mut().flatten().flatten()
    }

    /// Tear down tile state; the grid shape stays.
    pub fn destroy(&mut self) {
        for tile in self.tiles_mut() {
            tile.destroy();
        }
        self.callbacks.clear();
        self.tilemap_layer = None;
    }
}

pub(crate) fn empty_cell(insert_null: bool, x: i32, y: i32, w: f32, h: f32) -> Cell {
    if insert_null {
        None
    } else {
        Some(Tile::empty(x, y, w, h))
    }
}
