use crate::object::MapObject;
use crate::properties::Properties;
use log::warn;
use crate::gid::GID_MASK;
use macroquad::prelude::{vec2, Vec2};
use std::collections::HashMap;

const DEFAULT_TILE_SIZE: u32 = 32;

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationFrame {
    /// Local tile ID shown during this frame.
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

/// Collision shapes authored on a single tile.
#[derive(Debug, Clone, Default)]
pub struct ObjectGroup {
    /// Group name from the editor.
    pub name: String,
    /// Shapes in tile-local pixels.
    pub objects: Vec<MapObject>,
}

/// Extra per-tile data authored in the tileset.
#[derive(Debug, Clone, Default)]
pub struct TileData {
    /// Collision shapes, if any were drawn.
    pub object_group: Option<ObjectGroup>,
    /// Frames in playback order; empty for static tiles.
    pub animation: Vec<AnimationFrame>,
    /// Custom tile type (`type`/`class`).
    pub type_name: Option<String>,
}

/// An image sliced into a regular grid of tiles, owning GIDs
/// `first_gid .. first_gid + total`.
#[derive(Debug, Clone)]
pub struct Tileset {
    /// Tileset name, or the image key for collection images.
    pub name: String,
    /// GID of local tile 0.
    pub first_gid: u32,
    /// Pixels.
    pub tile_width: u32,
    /// Pixels.
    pub tile_height: u32,
    /// Border around the whole atlas, pixels.
    pub tile_margin: u32,
    /// Gap between atlas cells, pixels.
    pub tile_spacing: u32,
    /// Keyed by local (zero-based) tile ID.
    pub tile_properties: HashMap<u32, Properties>,
    /// Keyed by local (zero-based) tile ID.
    pub tile_data: HashMap<u32, TileData>,
    /// Draw offset applied to every tile.
    pub tile_offset: Vec2,
    /// Image key, once known.
    pub image: Option<String>,
    image_size: Option<(u32, u32)>,
    /// Atlas rows.
    pub rows: u32,
    /// Atlas columns.
    pub columns: u32,
    /// Tiles addressable through this set.
    pub total: u32,
    /// Last GID before the next tileset in file order, when one follows.
    pub last_gid: Option<u32>,
}

impl Tileset {
    /// Zero tile sizes fall back to 32 pixels.
    pub fn new(
        name: impl Into<String>,
        first_gid: u32,
        tile_width: u32,
        tile_height: u32,
        tile_margin: u32,
        tile_spacing: u32,
    ) -> Self {
        Tileset {
            name: name.into(),
            first_gid,
            tile_width: if tile_width == 0 { DEFAULT_TILE_SIZE } else { tile_width },
            tile_height: if tile_height == 0 { DEFAULT_TILE_SIZE } else { tile_height },
            tile_margin,
            tile_spacing,
            tile_properties: HashMap::new(),
            tile_data: HashMap::new(),
            tile_offset: Vec2::ZERO,
            image: None,
            image_size: None,
            rows: 0,
            columns: 0,
            total: 0,
            last_gid: None,
        }
    }

    /// Whether `gid` falls in `first_gid .. first_gid + total`.
    #[inline]
    pub fn contains_tile_index(&self, gid: i64) -> bool {
        gid >= self.first_gid as i64 && gid < self.first_gid as i64 + self.total as i64
    }

    fn local_id(&self, gid: i64) -> Option<u32> {
        self.contains_tile_index(gid)
            .then(|| (gid - self.first_gid as i64) as u32)
    }

    /// Declared properties of the tile, if it has any.
    pub fn get_tile_properties(&self, gid: i64) -> Option<&Properties> {
        self.local_id(gid).and_then(|id| self.tile_properties.get(&id))
    }

    /// Animation, type and collision shapes of the tile.
    pub fn get_tile_data(&self, gid: i64) -> Option<&TileData> {
        self.local_id(gid).and_then(|id| self.tile_data.get(&id))
    }

    /// Collision shapes authored on the tile.
    pub fn get_tile_collision_group(&self, gid: i64) -> Option<&ObjectGroup> {
        self.get_tile_data(gid).and_then(|d| d.object_group.as_ref())
    }

    /// Pixel position of the tile inside the atlas image.
    pub fn get_tile_texture_coordinates(&self, gid: i64) -> Option<Vec2> {
        let id = self.local_id(gid)?;
        let (col, row) = (id % self.columns, id / self.columns);
        let step_x = self.tile_width as f32 + self.tile_spacing as f32;
        let step_y = self.tile_height as f32 + self.tile_spacing as f32;
        let margin = self.tile_margin as f32;
        Some(vec2(margin + col as f32 * step_x, margin + row as f32 * step_y))
    }

    /// Bind an image and rebuild the atlas from its pixel size.
    pub fn set_image(&mut self, key: impl Into<String>, size: (u32, u32)) -> &mut Self {
        self.image = Some(key.into());
        self.image_size = Some(size);
        self.update_tile_data(size.0, size.1)
    }

    /// Change tile size; `None` keeps the current value.
    pub fn set_tile_size(&mut self, tile_width: Option<u32>, tile_height: Option<u32>) -> &mut Self {
        if let Some(w) = tile_width {
            self.tile_width = w;
        }
        if let Some(h) = tile_height {
            self.tile_height = h;
        }
        self.refresh_from_image()
    }

    /// Change margin and spacing; `None` keeps the current value.
    pub fn set_spacing(&mut self, margin: Option<u32>, spacing: Option<u32>) -> &mut Self {
        if let Some(m) = margin {
            self.tile_margin = m;
        }
        if let Some(s) = spacing {
            self.tile_spacing = s;
        }
        self.refresh_from_image()
    }

    fn refresh_from_image(&mut self) -> &mut Self {
        match (self.image.is_some(), self.image_size) {
            (true, Some((w, h))) => self.update_tile_data(w, h),
            _ => self,
        }
    }

    /// Recompute `rows`, `columns` and `total` from the image size.
    ///
    /// An image area that is not a whole number of tile cells is floored
    /// and reported. `total` is clamped so the tileset stays inside the
    /// 29-bit GID space.
    pub fn update_tile_data(&mut self, image_width: u32, image_height: u32) -> &mut Self {
        let rows = cell_count(image_height, self.tile_margin, self.tile_spacing, self.tile_height);
        let cols = cell_count(image_width, self.tile_margin, self.tile_spacing, self.tile_width);

        if rows.fract() != 0.0 || cols.fract() != 0.0 {
            warn!("Image tile area not tile size multiple in: {}", self.name);
        }

        self.image_size = Some((image_width, image_height));
        self.rows = rows.floor().max(0.0) as u32;
        self.columns = cols.floor().max(0.0) as u32;

        let cells = self.rows as u64 * self.columns as u64;
        let room = (GID_MASK as u64 + 1).saturating_sub(self.first_gid as u64);
        if cells > room {
            warn!(
                "Tileset {} has {cells} tiles, more than the GID space allows; keeping {room}",
                self.name
            );
        }
        self.total = cells.min(room) as u32;
        self
    }
}

fn cell_count(image: u32, margin: u32, spacing: u32, tile: u32) -> f64 {
    let stride = tile as f64 + spacing as f64;
    if stride == 0.0 {
        return 0.0;
    }
    (image as f64 - margin as f64 * 2.0 + spacing as f64) / stride
}

/// One whole image inside an [`ImageCollection`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionImage {
    /// GID assigned to this image.
    pub gid: u32,
    /// Image key.
    pub image: String,
}

/// A tile source made of distinct images instead of one sliced atlas.
#[derive(Debug, Clone)]
pub struct ImageCollection {
    /// Collection name.
    pub name: String,
    /// GID of local tile 0.
    pub first_gid: u32,
    /// Default image width, pixels.
    pub image_width: u32,
    /// Default image height, pixels.
    pub image_height: u32,
    /// Unused by collections; carried from the document.
    pub image_margin: u32,
    /// Unused by collections; carried from the document.
    pub image_spacing: u32,
    /// Collection-level properties.
    pub properties: Properties,
    /// Images in document order.
    pub images: Vec<CollectionImage>,
    /// Number of images.
    pub total: u32,
    /// Highest local ID seen while parsing.
    pub max_id: u32,
    /// Last GID before the next tileset in file order, when one follows.
    pub last_gid: Option<u32>,
}

impl ImageCollection {
    /// Zero sizes fall back to 32 pixels.
    pub fn new(
        name: impl Into<String>,
        first_gid: u32,
        width: u32,
        height: u32,
        margin: u32,
        spacing: u32,
        properties: Properties,
    ) -> Self {
        ImageCollection {
            name: name.into(),
            first_gid,
            image_width: if width == 0 { DEFAULT_TILE_SIZE } else { width },
            image_height: if height == 0 { DEFAULT_TILE_SIZE } else { height },
            image_margin: margin,
            image_spacing: spacing,
            properties,
            images: Vec::new(),
            total: 0,
            max_id: 0,
            last_gid: None,
        }
    }

    /// Whether `gid` falls in `first_gid .. first_gid + total`.
    pub fn contains_image_index(&self, gid: i64) -> bool {
        gid >= self.first_gid as i64 && gid < self.first_gid as i64 + self.total as i64
    }

    /// Append an image at `gid`.
    pub fn add_image(&mut self, gid: u32, image: impl Into<String>) -> &mut Self {
        self.images.push(CollectionImage {
            gid,
            image: image.into(),
        });
        self.total += 1;
        self
    }
}
