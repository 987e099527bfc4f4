//! Tile lookup by coordinate, world position and rectangular region.

use crate::grid::transform::LayerTransform;
use crate::layer::LayerData;
use crate::tile::Tile;

/// Filters applied by region queries. All default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilteringOptions {
    /// Skip index `-1` tiles.
    pub is_not_empty: bool,
    /// Keep only tiles with a collide side set.
    pub is_colliding: bool,
    /// Keep only tiles with an interesting face.
    pub has_interesting_face: bool,
}

impl FilteringOptions {
    pub fn colliding() -> Self {
        FilteringOptions {
            is_colliding: true,
            ..Default::default()
        }
    }

    pub fn interesting_faces() -> Self {
        FilteringOptions {
            has_interesting_face: true,
            ..Default::default()
        }
    }

    pub fn accepts(&self, tile: &Tile) -> bool {
        !(self.is_not_empty && tile.index == -1
            || self.is_colliding && !tile.collides()
            || self.has_interesting_face && !tile.has_interesting_face())
    }
}

/// A rectangle of tile coordinates clipped to the layer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRegion {
    pub start_x: i32,
    pub start_y: i32,
    pub width: i32,
    pub height: i32,
}

impl TileRegion {
    /// Clip `(x, y, width, height)` to `[0, layer.width) × [0, layer.height)`.
    ///
    /// Extents are clipped in `i64`, so any `i32` input yields a region
    /// inside the grid, possibly empty.
    pub fn clipped(layer: &LayerData, x: i32, y: i32, width: i32, height: i32) -> Self {
        let (start_x, width) = clip_axis(x, width, layer.width);
        let (start_y, height) = clip_axis(y, height, layer.height);
        TileRegion {
            start_x,
            start_y,
            width,
            height,
        }
    }

    /// Coordinates in row-major order.
    pub fn coords(self) -> impl Iterator<Item = (i32, i32)> {
        (self.start_y..self.start_y + self.height)
            .flat_map(move |y| (self.start_x..self.start_x + self.width).map(move |x| (x, y)))
    }
}

fn clip_axis(start: i32, len: i32, limit: usize) -> (i32, i32) {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX).min(i32::MAX as i64);
    let lo = (start as i64).clamp(0, limit);
    let hi = (start as i64 + len as i64).clamp(lo, limit);
    (lo as i32, (hi - lo) as i32)
}

/// Tile at `(x, y)`. Index `-1` tiles are returned only when `non_null` is set.
pub fn get_tile_at(layer: &LayerData, x: i32, y: i32, non_null: bool) -> Option<&Tile> {
    let tile = layer.cell(x, y)?.as_ref()?;
    if tile.index == -1 && !non_null {
        None
    } else {
        Some(tile)
    }
}

pub fn get_tile_at_mut(layer: &mut LayerData, x: i32, y: i32, non_null: bool) -> Option<&mut Tile> {
    let tile = layer.cell_mut(x, y)?.as_mut()?;
    if tile.index == -1 && !non_null {
        None
    } else {
        Some(tile)
    }
}

/// Whether a non-empty tile sits at `(x, y)`.
pub fn has_tile_at(layer: &LayerData, x: i32, y: i32) -> bool {
    get_tile_at(layer, x, y, false).is_some()
}

pub fn get_tile_at_world_xy<'a>(
    layer: &'a LayerData,
    transform: &LayerTransform,
    world_x: f32,
    world_y: f32,
    non_null: bool,
) -> Option<&'a Tile> {
    let (x, y) = transform.world_to_tile_cell(world_x, world_y);
    get_tile_at(layer, x, y, non_null)
}

pub fn has_tile_at_world_xy(layer: &LayerData, transform: &LayerTransform, world_x: f32, world_y: f32) -> bool {
    get_tile_at_world_xy(layer, transform, world_x, world_y, false).is_some()
}

/// Tiles inside the clipped region, row-major. Null cells are skipped.
pub fn get_tiles_within(
    layer: &LayerData,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    filter: FilteringOptions,
) -> Vec<&Tile> {
    TileRegion::clipped(layer, x, y, width, height)
        .coords()
        .filter_map(|(tx, ty)| layer.cell(tx, ty).and_then(|c| c.as_ref()))
        .filter(|t| filter.accepts(t))
        .collect()
}

/// Tile region covering a world rectangle, partially covered tiles included.
pub fn world_region(transform: &LayerTransform, world_x: f32, world_y: f32, width: f32, height: f32) -> (i32, i32, i32, i32) {
    let start = transform.world_to_tile_xy(world_x, world_y, true);
    let end = transform.world_to_tile_xy(world_x + width, world_y + height, false);
    let (x, width) = world_span(start.x, end.x);
    let (y, height) = world_span(start.y, end.y);
    (x, y, width, height)
}

/// Tile span from a floored start to a ceiled end, with the start clamped at zero.
fn world_span(start: f32, end: f32) -> (i32, i32) {
    let lo = (start as i64).max(0);
    let hi = end.ceil() as i64;
    let clamp = |v: i64| v.clamp(0, i32::MAX as i64) as i32;
    (clamp(lo), clamp(hi.saturating_sub(lo)))
}

pub fn get_tiles_within_world_xy<'a>(
    layer: &'a LayerData,
    transform: &LayerTransform,
    world_x: f32,
    world_y: f32,
    width: f32,
    height: f32,
    filter: FilteringOptions,
) -> Vec<&'a Tile> {
    let (x, y, w, h) = world_region(transform, world_x, world_y, width, height);
    get_tiles_within(layer, x, y, w, h, filter)
}
