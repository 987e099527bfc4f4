use crate::error::MapError;
use crate::grid::collision::{self, collision_callback_for};
use crate::grid::edit::{self, TileSource};
use crate::grid::faces;
use crate::grid::query::{self, FilteringOptions};
use crate::grid::transform::LayerTransform;
use crate::layer::LayerData;
use crate::loader::json_loader::{decode_map_file, parse_json_tiled, ParseOptions};
use crate::loader::tilesets::build_tileset_index;
use crate::map_data::{MapData, MapFormat};
use crate::object::{MapObject, ObjectLayer};
use crate::properties::PropertyValue;
use crate::tile::{CollisionCallback, Tile};
use crate::tilemap_layer::{TilemapLayer, TilemapLayerId};
use crate::tileset::Tileset;
use anyhow::Context;
use log::warn;
use macroquad::prelude::Vec2;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::Path;

/// Supplies pixel sizes for image keys. The grid never touches pixels itself.
pub trait ImageRegistry {
    fn image_size(&self, key: &str) -> Option<(u32, u32)>;
}

impl<S: BuildHasher> ImageRegistry for HashMap<String, (u32, u32), S> {
    fn image_size(&self, key: &str) -> Option<(u32, u32)> {
        self.get(key).copied()
    }
}

/// Selects a tile layer on a [`Tilemap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerRef<'a> {
    /// The layer cursor, see [`Tilemap::set_layer`].
    Current,
    Index(usize),
    Name(&'a str),
    /// The layer a runtime layer is attached to.
    Attached(TilemapLayerId),
}

impl From<usize> for LayerRef<'_> {
    fn from(i: usize) -> Self {
        LayerRef::Index(i)
    }
}

impl<'a> From<&'a str> for LayerRef<'a> {
    fn from(name: &'a str) -> Self {
        LayerRef::Name(name)
    }
}

impl From<TilemapLayerId> for LayerRef<'_> {
    fn from(id: TilemapLayerId) -> Self {
        LayerRef::Attached(id)
    }
}

/// Overrides for [`Tilemap::add_tileset_image`]. `None` keeps the tileset's
/// value, or the map's tile size for a new tileset.
#[derive(Debug, Clone, Copy, Default)]
pub struct TilesetImageOptions {
    pub tile_width: Option<u32>,
    pub tile_height: Option<u32>,
    pub margin: Option<u32>,
    pub spacing: Option<u32>,
    /// First GID of a newly created tileset.
    pub gid: u32,
}

#[derive(Debug, Default)]
struct RuntimeSlot {
    generation: u32,
    layer: Option<TilemapLayer>,
}

/// Runtime façade over parsed map data.
#[derive(Debug)]
pub struct Tilemap {
    pub data: MapData,
    current_layer_index: usize,
    runtime: Vec<RuntimeSlot>,
}

impl Tilemap {
    pub fn new(data: MapData) -> Self {
        Tilemap {
            data,
            current_layer_index: 0,
            runtime: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str, options: &ParseOptions) -> Result<Self, MapError> {
        parse_json_tiled(json, options).map(Self::new)
    }

    /// Load a `.json` map from disk with default options.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with(path, &ParseOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, options: &ParseOptions) -> anyhow::Result<Self> {
        let p = path.as_ref();
        let data = decode_map_file(p, options)
            .with_context(|| format!("Loading map {}", p.display()))?;
        Ok(Self::new(data))
    }

    /// An empty map for building levels in code.
    pub fn blank(tile_width: f32, tile_height: f32, width: usize, height: usize) -> Self {
        Self::new(MapData::new(
            "map",
            width,
            height,
            tile_width,
            tile_height,
            MapFormat::Blank,
        ))
    }

    // ---- layers ----

    pub fn get_layer_index<'a>(&self, layer: impl Into<LayerRef<'a>>) -> Option<usize> {
        let len = self.data.layers.len();
        match layer.into() {
            LayerRef::Current => Some(self.current_layer_index).filter(|&i| i < len),
            LayerRef::Index(i) => Some(i).filter(|&i| i < len),
            LayerRef::Name(name) => self.get_layer_index_by_name(name),
            LayerRef::Attached(id) => self.tilemap_layer(id).map(|l| l.layer_index),
        }
    }

    pub fn get_layer_index_by_name(&self, name: &str) -> Option<usize> {
        self.data.layers.iter().position(|l| l.name == name)
    }

    pub fn get_layer<'a>(&self, layer: impl Into<LayerRef<'a>>) -> Option<&LayerData> {
        let i = self.get_layer_index(layer)?;
        self.data.layers.get(i)
    }

    pub fn get_layer_mut<'a>(&mut self, layer: impl Into<LayerRef<'a>>) -> Option<&mut LayerData> {
        let i = self.get_layer_index(layer)?;
        self.data.layers.get_mut(i)
    }

    pub fn get_tile_layer_names(&self) -> Vec<&str> {
        self.data.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Move the layer cursor. Unknown layers leave it where it is.
    pub fn set_layer<'a>(&mut self, layer: impl Into<LayerRef<'a>>) -> &mut Self {
        if let Some(i) = self.get_layer_index(layer) {
            self.current_layer_index = i;
        }
        self
    }

    pub fn current_layer_index(&self) -> usize {
        self.current_layer_index
    }

    // ---- runtime layers ----

    pub fn tilemap_layer(&self, id: TilemapLayerId) -> Option<&TilemapLayer> {
        self.runtime
            .get(id.slot())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.layer.as_ref())
    }

    pub fn tilemap_layer_mut(&mut self, id: TilemapLayerId) -> Option<&mut TilemapLayer> {
        self.runtime
            .get_mut(id.slot())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.layer.as_mut())
    }

    fn resolve_tilesets(&self, names: &[&str]) -> Vec<usize> {
        names
            .iter()
            .filter_map(|name| {
                let found = self.get_tileset_index(name);
                if found.is_none() {
                    warn!("Tileset '{name}' not found on map '{}'", self.data.name);
                }
                found
            })
            .collect()
    }

    fn attach(&mut self, index: usize, tilesets: &[&str], x: f32, y: f32) -> TilemapLayerId {
        let slot = match self.runtime.iter().position(|s| s.layer.is_none()) {
            Some(free) => free,
            None => {
                self.runtime.push(RuntimeSlot::default());
                self.runtime.len() - 1
            }
        };
        let id = TilemapLayerId::new(slot as u32, self.runtime[slot].generation);
        let indices = self.resolve_tilesets(tilesets);
        let mut runtime = TilemapLayer::new(id, index, &self.data.layers[index], x, y);
        runtime.set_tilesets(&self.data.tilesets, &indices);
        self.runtime[slot].layer = Some(runtime);
        self.data.layers[index].tilemap_layer = Some(id);
        self.current_layer_index = index;
        id
    }

    /// Attach a runtime layer to a parsed layer.
    ///
    /// Position defaults to the layer's own offset. Returns `None` for an
    /// unknown layer or one that is already attached.
    pub fn create_layer<'a>(
        &mut self,
        layer: impl Into<LayerRef<'a>>,
        tilesets: &[&str],
        x: Option<f32>,
        y: Option<f32>,
    ) -> Option<TilemapLayerId> {
        let layer = layer.into();
        let Some(index) = self.get_layer_index(layer) else {
            warn!("Invalid Tilemap Layer ID: {layer:?}");
            if matches!(layer, LayerRef::Name(_)) {
                warn!("Valid tilelayer names: {:?}", self.get_tile_layer_names());
            }
            return None;
        };

        let data = &self.data.layers[index];
        if data.tilemap_layer.is_some() {
            warn!("Tilemap Layer ID already exists: {layer:?}");
            return None;
        }
        let (x, y) = (x.unwrap_or(data.x), y.unwrap_or(data.y));
        Some(self.attach(index, tilesets, x, y))
    }

    /// Add an empty layer filled with index `-1` tiles and attach it.
    ///
    /// Size and tile size default to the map's. Fails when the name is taken.
    #[allow(clippy::too_many_arguments)]
    pub fn create_blank_layer(
        &mut self,
        name: &str,
        tilesets: &[&str],
        x: f32,
        y: f32,
        width: Option<usize>,
        height: Option<usize>,
        tile_width: Option<f32>,
        tile_height: Option<f32>,
    ) -> Option<TilemapLayerId> {
        if self.get_layer_index_by_name(name).is_some() {
            warn!("Invalid Tilemap Layer ID: {name}");
            return None;
        }

        let mut layer = LayerData::new(
            name,
            width.unwrap_or(self.data.width),
            height.unwrap_or(self.data.height),
            tile_width.unwrap_or(self.data.tile_width),
            tile_height.unwrap_or(self.data.tile_height),
        );
        layer.orientation = self.data.orientation;
        layer.fill_empty(false);
        self.data.layers.push(layer);

        let index = self.data.layers.len() - 1;
        Some(self.attach(index, tilesets, x, y))
    }

    /// Drop a runtime layer, clearing the back-reference on its layer.
    pub fn detach_layer(&mut self, id: TilemapLayerId) -> Option<TilemapLayer> {
        let slot = self
            .runtime
            .get_mut(id.slot())
            .filter(|s| s.generation == id.generation())?;
        let runtime = slot.layer.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if let Some(layer) = self.data.layers.get_mut(runtime.layer_index) {
            if layer.tilemap_layer == Some(id) {
                layer.tilemap_layer = None;
            }
        }
        Some(runtime)
    }

    /// Remove a layer from the map, detaching and destroying it.
    pub fn remove_layer<'a>(&mut self, layer: impl Into<LayerRef<'a>>) -> bool {
        let Some(index) = self.get_layer_index(layer) else {
            return false;
        };
        if let Some(id) = self.data.layers[index].tilemap_layer {
            self.detach_layer(id);
        }

        let mut removed = self.data.layers.remove(index);
        removed.destroy();

        for runtime in self.runtime.iter_mut().filter_map(|s| s.layer.as_mut()) {
            if runtime.layer_index > index {
                runtime.layer_index -= 1;
            }
        }
        if self.current_layer_index == index {
            self.current_layer_index = 0;
        } else if self.current_layer_index > index {
            self.current_layer_index -= 1;
        }
        true
    }

    /// Origin, scale and tile size used for world conversions on a layer.
    pub fn layer_transform<'a>(&self, layer: impl Into<LayerRef<'a>>) -> Option<LayerTransform> {
        let data = self.get_layer(layer)?;
        Some(match data.tilemap_layer.and_then(|id| self.tilemap_layer(id)) {
            Some(runtime) => runtime.transform(data),
            None => LayerTransform::unattached(data),
        })
    }

    // ---- tilesets ----

    pub fn get_tileset(&self, name: &str) -> Option<&Tileset> {
        self.data.tilesets.iter().find(|t| t.name == name)
    }

    pub fn get_tileset_index(&self, name: &str) -> Option<usize> {
        self.data.tilesets.iter().position(|t| t.name == name)
    }

    /// Rebuild the global GID index after tilesets changed.
    pub fn rebuild_tile_index(&mut self) {
        self.data.tiles = build_tileset_index(&self.data.tilesets);
    }

    /// Bind an image to a tileset, creating the tileset on blank maps.
    ///
    /// `key` defaults to the tileset name. Returns the tileset index, or
    /// `None` when the image is unknown to `registry` or a parsed map has
    /// no tileset of that name.
    pub fn add_tileset_image(
        &mut self,
        name: &str,
        key: Option<&str>,
        registry: &impl ImageRegistry,
        options: TilesetImageOptions,
    ) -> Option<usize> {
        let key = key.unwrap_or(name);
        let Some(size) = registry.image_size(key) else {
            warn!("Texture key \"{key}\" not found");
            return None;
        };

        let index = match self.get_tileset_index(name) {
            Some(i) => {
                let ts = &mut self.data.tilesets[i];
                ts.set_tile_size(options.tile_width, options.tile_height);
                ts.set_spacing(options.margin, options.spacing);
                ts.set_image(key, size);
                i
            }
            None if self.data.format == MapFormat::TiledJson => {
                warn!("No data found for Tileset: {name}");
                return None;
            }
            None => {
                let mut ts = Tileset::new(
                    name,
                    options.gid,
                    options.tile_width.unwrap_or(self.data.tile_width as u32),
                    options.tile_height.unwrap_or(self.data.tile_height as u32),
                    options.margin.unwrap_or(0),
                    options.spacing.unwrap_or(0),
                );
                ts.set_image(key, size);
                self.data.tilesets.push(ts);
                self.data.tilesets.len() - 1
            }
        };

        self.rebuild_tile_index();
        Some(index)
    }

    /// Tileset owning `tile`, via the GID map of the layer's runtime attachment.
    pub fn tileset_for_tile<'a>(&self, tile: &Tile, layer: impl Into<LayerRef<'a>>) -> Option<&Tileset> {
        let data = self.get_layer(layer)?;
        let runtime = self.tilemap_layer(data.tilemap_layer?)?;
        runtime
            .tileset_index_for(tile.index)
            .and_then(|i| self.data.tilesets.get(i))
    }

    fn tile_size_for(&self, index: i32) -> Option<(f32, f32)> {
        let entry = self.data.tile_index_entry(index as i64)?;
        let ts = self.data.tilesets.get(entry.tileset_index)?;
        Some((ts.tile_width as f32, ts.tile_height as f32))
    }

    // ---- coordinates ----

    pub fn tile_to_world_xy<'a>(&self, tile_x: i32, tile_y: i32, layer: impl Into<LayerRef<'a>>) -> Option<Vec2> {
        Some(self.layer_transform(layer)?.tile_to_world_xy(tile_x, tile_y))
    }

    pub fn world_to_tile_xy<'a>(
        &self,
        world_x: f32,
        world_y: f32,
        snap_to_floor: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> Option<Vec2> {
        Some(self.layer_transform(layer)?.world_to_tile_xy(world_x, world_y, snap_to_floor))
    }

    // ---- tile queries ----

    pub fn get_tile_at<'a>(&self, x: i32, y: i32, non_null: bool, layer: impl Into<LayerRef<'a>>) -> Option<&Tile> {
        query::get_tile_at(self.get_layer(layer)?, x, y, non_null)
    }

    pub fn has_tile_at<'a>(&self, x: i32, y: i32, layer: impl Into<LayerRef<'a>>) -> bool {
        self.get_layer(layer)
            .is_some_and(|l| query::has_tile_at(l, x, y))
    }

    pub fn get_tile_at_world_xy<'a>(
        &self,
        world_x: f32,
        world_y: f32,
        non_null: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> Option<&Tile> {
        let layer = layer.into();
        let transform = self.layer_transform(layer)?;
        query::get_tile_at_world_xy(self.get_layer(layer)?, &transform, world_x, world_y, non_null)
    }

    pub fn has_tile_at_world_xy<'a>(&self, world_x: f32, world_y: f32, layer: impl Into<LayerRef<'a>>) -> bool {
        self.get_tile_at_world_xy(world_x, world_y, false, layer).is_some()
    }

    pub fn get_tiles_within<'a>(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        filter: FilteringOptions,
        layer: impl Into<LayerRef<'a>>,
    ) -> Vec<&Tile> {
        self.get_layer(layer)
            .map(|l| query::get_tiles_within(l, x, y, width, height, filter))
            .unwrap_or_default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn get_tiles_within_world_xy<'a>(
        &self,
        world_x: f32,
        world_y: f32,
        width: f32,
        height: f32,
        filter: FilteringOptions,
        layer: impl Into<LayerRef<'a>>,
    ) -> Vec<&Tile> {
        let layer = layer.into();
        match (self.get_layer(layer), self.layer_transform(layer)) {
            (Some(data), Some(t)) => query::get_tiles_within_world_xy(data, &t, world_x, world_y, width, height, filter),
            _ => Vec::new(),
        }
    }

    // ---- collision ----

    pub fn calculate_faces_within<'a>(&mut self, x: i32, y: i32, width: i32, height: i32, layer: impl Into<LayerRef<'a>>) {
        if let Some(l) = self.get_layer_mut(layer) {
            faces::calculate_faces_within(l, x, y, width, height);
        }
    }

    pub fn calculate_faces_at<'a>(&mut self, x: i32, y: i32, layer: impl Into<LayerRef<'a>>) {
        if let Some(l) = self.get_layer_mut(layer) {
            faces::calculate_faces_at(l, x, y);
        }
    }

    pub fn set_collision<'a>(
        &mut self,
        indexes: &[i32],
        collides: bool,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| collision::set_collision(l, indexes, collides, recalculate_faces, true))
            .is_some()
    }

    pub fn set_collision_between<'a>(
        &mut self,
        start: i32,
        stop: i32,
        collides: bool,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| collision::set_collision_between(l, start, stop, collides, recalculate_faces, true))
            .is_some()
    }

    pub fn set_collision_by_exclusion<'a>(
        &mut self,
        indexes: &[i32],
        collides: bool,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| collision::set_collision_by_exclusion(l, indexes, collides, recalculate_faces))
            .is_some()
    }

    pub fn set_collision_by_property<'a>(
        &mut self,
        properties: &[(&str, PropertyValue)],
        collides: bool,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| collision::set_collision_by_property(l, properties, collides, recalculate_faces))
            .is_some()
    }

    pub fn set_tile_index_callback<'a>(
        &mut self,
        indexes: &[i32],
        callback: Option<CollisionCallback>,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| collision::set_tile_index_callback(l, indexes, callback))
            .is_some()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_tile_location_callback<'a>(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        callback: Option<CollisionCallback>,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| collision::set_tile_location_callback(l, x, y, width, height, callback))
            .is_some()
    }

    /// Callback for the tile at `(x, y)`: the tile's own, then the layer's per-index one.
    pub fn collision_callback_at<'a>(&self, x: i32, y: i32, layer: impl Into<LayerRef<'a>>) -> Option<&CollisionCallback> {
        let data = self.get_layer(layer)?;
        let tile = query::get_tile_at(data, x, y, true)?;
        collision_callback_for(data, tile)
    }

    // ---- edits ----

    /// Place a tile, sized from its owning tileset when the global index knows it.
    pub fn put_tile_at<'a>(
        &mut self,
        source: TileSource<'_>,
        x: i32,
        y: i32,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> Option<&Tile> {
        let size = self.tile_size_for(source.index());
        let data = self.get_layer_mut(layer)?;
        edit::put_tile_at(data, source, x, y, size, recalculate_faces)
    }

    pub fn put_tile_at_world_xy<'a>(
        &mut self,
        source: TileSource<'_>,
        world_x: f32,
        world_y: f32,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> Option<&Tile> {
        let layer = layer.into();
        let (x, y) = self.layer_transform(layer)?.world_to_tile_cell(world_x, world_y);
        self.put_tile_at(source, x, y, recalculate_faces, layer)
    }

    pub fn remove_tile_at<'a>(
        &mut self,
        x: i32,
        y: i32,
        replace_with_null: bool,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> Option<Tile> {
        edit::remove_tile_at(self.get_layer_mut(layer)?, x, y, replace_with_null, recalculate_faces)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn fill<'a>(
        &mut self,
        index: i32,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        let size = self.tile_size_for(index);
        self.get_layer_mut(layer)
            .map(|l| edit::fill(l, index, x, y, width, height, size, recalculate_faces))
            .is_some()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn copy<'a>(
        &mut self,
        src_x: i32,
        src_y: i32,
        width: i32,
        height: i32,
        dest_x: i32,
        dest_y: i32,
        recalculate_faces: bool,
        layer: impl Into<LayerRef<'a>>,
    ) -> bool {
        self.get_layer_mut(layer)
            .map(|l| edit::copy(l, src_x, src_y, width, height, dest_x, dest_y, recalculate_faces))
            .is_some()
    }

    // ---- objects and images ----

    pub fn get_object_layer(&self, name: &str) -> Option<&ObjectLayer> {
        self.data.objects.iter().find(|o| o.name == name)
    }

    pub fn get_object_layer_names(&self) -> Vec<&str> {
        self.data.objects.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn find_object(&self, layer: &str, predicate: impl FnMut(&MapObject) -> bool) -> Option<&MapObject> {
        self.get_object_layer(layer)?.find(predicate)
    }

    pub fn filter_objects(&self, layer: &str, predicate: impl FnMut(&MapObject) -> bool) -> Vec<&MapObject> {
        self.get_object_layer(layer)
            .map(|l| l.filter(predicate))
            .unwrap_or_default()
    }

    pub fn get_image_index(&self, name: &str) -> Option<usize> {
        self.data.images.iter().position(|i| i.name == name)
    }

    pub fn get_image_layer_names(&self) -> Vec<&str> {
        self.data.images.iter().map(|i| i.name.as_str()).collect()
    }
}
