//! Incremental edits that keep collision faces consistent.

use crate::grid::collision::set_tile_collision;
use crate::grid::faces::{calculate_faces_at, calculate_faces_within};
use crate::grid::query::{get_tile_at_mut, get_tiles_within, FilteringOptions, TileRegion};
use crate::layer::LayerData;
use crate::tile::Tile;

/// What to place with [`put_tile_at`].
#[derive(Debug, Clone, Copy)]
pub enum TileSource<'a> {
    Index(i32),
    /// Copy index, flags and properties from an existing tile.
    Tile(&'a Tile),
}

impl TileSource<'_> {
    pub fn index(&self) -> i32 {
        match self {
            TileSource::Index(i) => *i,
            TileSource::Tile(t) => t.index,
        }
    }
}

/// Place a tile at `(x, y)`, returning the placed tile or `None` out of bounds.
///
/// `size` is the tile size of the owning tileset; empty tiles and `None`
/// use the layer's tile size. Collision comes from the layer's
/// `collide_indexes`. Overwriting a tile without changing its collision
/// keeps its faces; with `recalculate_faces` the cell and its neighbours are
/// recomputed whenever the old or new tile collides.
pub fn put_tile_at<'a>(
    layer: &'a mut LayerData,
    source: TileSource<'_>,
    x: i32,
    y: i32,
    size: Option<(f32, f32)>,
    recalculate_faces: bool,
) -> Option<&'a Tile> {
    if !layer.in_bounds(x, y) {
        return None;
    }

    let index = source.index();
    let (tw, th) = (layer.tile_width, layer.tile_height);
    let collides = layer.collide_indexes.contains(&index);
    let (w, h) = if index == -1 { (tw, th) } else { size.unwrap_or((tw, th)) };

    let cell = layer.cell_mut(x, y)?;
    let old_collides = cell.as_ref().is_some_and(|t| t.collides());
    let old_faces = cell
        .as_ref()
        .map(|t| (t.face_top, t.face_bottom, t.face_left, t.face_right));
    let tile = match source {
        TileSource::Index(i) => {
            let tile = cell.get_or_insert_with(|| Tile::new(i, x, y, tw, th));
            tile.index = i;
            tile
        }
        TileSource::Tile(src) => {
            let tile = cell.get_or_insert_with(|| Tile::new(src.index, x, y, tw, th));
            tile.copy_from(src);
            tile
        }
    };
    tile.width = w;
    tile.height = h;
    set_tile_collision(tile, collides);
    let new_collides = tile.collides();

    // same collision, same neighbours: the previous faces still hold
    if let (true, Some((top, bottom, left, right))) = (old_collides == new_collides, old_faces) {
        tile.face_top = top;
        tile.face_bottom = bottom;
        tile.face_left = left;
        tile.face_right = right;
    }

    if recalculate_faces && (old_collides || new_collides) {
        calculate_faces_at(layer, x, y);
    }
    layer.cell(x, y).and_then(|c| c.as_ref())
}

/// Take the tile out of `(x, y)`, leaving an empty tile or a null cell behind.
pub fn remove_tile_at(
    layer: &mut LayerData,
    x: i32,
    y: i32,
    replace_with_null: bool,
    recalculate_faces: bool,
) -> Option<Tile> {
    let (tw, th) = (layer.tile_width, layer.tile_height);
    let cell = layer.cell_mut(x, y)?;
    let old = cell.take()?;
    if !replace_with_null {
        *cell = Some(Tile::empty(x, y, tw, th));
    }
    if recalculate_faces && old.collides() {
        calculate_faces_at(layer, x, y);
    }
    Some(old)
}

/// Set every materialised tile in the region to `index`.
pub fn fill(
    layer: &mut LayerData,
    index: i32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    size: Option<(f32, f32)>,
    recalculate_faces: bool,
) {
    let region = TileRegion::clipped(layer, x, y, width, height);
    for (tx, ty) in region.coords() {
        if matches!(layer.cell(tx, ty), Some(Some(_))) {
            put_tile_at(layer, TileSource::Index(index), tx, ty, size, false);
        }
    }
    if recalculate_faces {
        calculate_faces_within(
            layer,
            x.saturating_sub(1),
            y.saturating_sub(1),
            width.saturating_add(2),
            height.saturating_add(2),
        );
    }
}

/// Copy a region onto another position of the same layer.
///
/// The source is snapshotted first, so overlapping regions copy cleanly.
pub fn copy(
    layer: &mut LayerData,
    src_x: i32,
    src_y: i32,
    width: i32,
    height: i32,
    dest_x: i32,
    dest_y: i32,
    recalculate_faces: bool,
) {
    let src_x = src_x.max(0);
    let src_y = src_y.max(0);
    let snapshot: Vec<Tile> = get_tiles_within(layer, src_x, src_y, width, height, FilteringOptions::default())
        .into_iter()
        .cloned()
        .collect();

    let (dx, dy) = (dest_x as i64 - src_x as i64, dest_y as i64 - src_y as i64);
    for src in &snapshot {
        let (Ok(tx), Ok(ty)) = (i32::try_from(src.x as i64 + dx), i32::try_from(src.y as i64 + dy)) else {
            continue;
        };
        if let Some(dest) = get_tile_at_mut(layer, tx, ty, true) {
            dest.copy_from(src);
        }
    }

    if recalculate_faces {
        calculate_faces_within(
            layer,
            dest_x.saturating_sub(1),
            dest_y.saturating_sub(1),
            width.saturating_add(2),
            height.saturating_add(2),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::collision::set_collision;
    use crate::grid::query::get_tile_at;

    fn blank(w: usize, h: usize) -> LayerData {
        let mut layer = LayerData::new("e", w, h, 16.0, 16.0);
        layer.fill_empty(false);
        layer
    }

    #[test]
    fn put_tile_picks_up_layer_collision_and_faces() {
        let mut layer = blank(3, 1);
        set_collision(&mut layer, &[4], true, false, true);

        put_tile_at(&mut layer, TileSource::Index(4), 0, 0, Some((32.0, 32.0)), true);
        put_tile_at(&mut layer, TileSource::Index(4), 1, 0, None, true);

        let a = get_tile_at(&layer, 0, 0, false).expect("tile");
        let b = get_tile_at(&layer, 1, 0, false).expect("tile");
        assert!(a.collides() && b.collides());
        assert_eq!((a.width, a.height), (32.0, 32.0));
        assert!(!a.face_right && !b.face_left);
        assert!(a.face_left && b.face_right);

        assert!(put_tile_at(&mut layer, TileSource::Index(4), 3, 0, None, true).is_none());
    }

    fn faces(layer: &LayerData) -> Vec<(bool, bool, bool, bool)> {
        layer
            .tiles()
            .map(|t| (t.face_top, t.face_bottom, t.face_left, t.face_right))
            .collect()
    }

    #[test]
    fn overwriting_solid_tile_matches_fresh_face_pass() {
        for recalculate in [true, false] {
            let mut layer = blank(3, 2);
            set_collision(&mut layer, &[1, 2], true, false, true);
            for (x, y) in [(0, 0), (1, 0), (2, 0), (1, 1)] {
                put_tile_at(&mut layer, TileSource::Index(1), x, y, None, true);
            }

            put_tile_at(&mut layer, TileSource::Index(1), 0, 0, None, recalculate);
            put_tile_at(&mut layer, TileSource::Index(2), 1, 0, None, recalculate);
            let incremental = faces(&layer);

            calculate_faces_within(&mut layer, 0, 0, 3, 2);
            assert_eq!(incremental, faces(&layer), "recalculate = {recalculate}");

            let centre = get_tile_at(&layer, 1, 0, false).expect("tile");
            assert!(centre.face_top);
            assert!(!centre.face_left && !centre.face_right && !centre.face_bottom);
        }
    }

    #[test]
    fn extreme_edit_regions_do_not_overflow() {
        let mut layer = blank(2, 2);
        fill(&mut layer, 3, 0, 0, i32::MAX, i32::MAX, None, true);
        assert!(layer.tiles().all(|t| t.index == 3));
        fill(&mut layer, 4, i32::MIN, i32::MIN, i32::MAX, i32::MAX, None, true);
        assert!(layer.tiles().all(|t| t.index == 3));

        copy(&mut layer, 0, 0, i32::MAX, i32::MAX, i32::MAX, i32::MIN, true);
        copy(&mut layer, i32::MIN, 0, 1, 1, i32::MAX, 0, true);
        assert!(layer.tiles().all(|t| t.index == 3));
    }

    #[test]
    fn put_tile_into_null_cell_materialises_it() {
        let mut layer = LayerData::new("e", 2, 1, 8.0, 8.0);
        layer.fill_empty(true);
        let placed = put_tile_at(&mut layer, TileSource::Index(9), 1, 0, None, false).expect("placed");
        assert_eq!((placed.index, placed.x, placed.y), (9, 1, 0));
    }

    #[test]
    fn remove_restores_neighbour_faces() {
        let mut layer = blank(2, 1);
        set_collision(&mut layer, &[1], true, false, true);
        put_tile_at(&mut layer, TileSource::Index(1), 0, 0, None, true);
        put_tile_at(&mut layer, TileSource::Index(1), 1, 0, None, true);
        assert!(!get_tile_at(&layer, 0, 0, false).expect("tile").face_right);

        let removed = remove_tile_at(&mut layer, 1, 0, false, true).expect("removed");
        assert_eq!(removed.index, 1);
        assert_eq!(get_tile_at(&layer, 1, 0, true).map(|t| t.index), Some(-1));
        assert!(get_tile_at(&layer, 0, 0, false).expect("tile").face_right);

        assert!(remove_tile_at(&mut layer, 0, 0, true, true).is_some());
        assert!(layer.cell(0, 0).is_some_and(|c| c.is_none()));
        assert!(remove_tile_at(&mut layer, 0, 0, true, true).is_none());
    }

    #[test]
    fn fill_skips_null_cells() {
        let mut layer = blank(3, 1);
        layer.data[0][1] = None;
        fill(&mut layer, 5, 0, 0, 3, 1, None, true);
        let idx: Vec<i32> = layer.tiles().map(|t| t.index).collect();
        assert_eq!(idx, vec![5, 5]);
    }

    #[test]
    fn copy_handles_overlap() {
        let mut layer = blank(4, 1);
        for x in 0..3 {
            put_tile_at(&mut layer, TileSource::Index(x + 1), x, 0, None, false);
        }
        copy(&mut layer, 0, 0, 3, 1, 1, 0, true);
        let idx: Vec<i32> = layer.tiles().map(|t| t.index).collect();
        assert_eq!(idx, vec![1, 1, 2, 3]);
        let moved = get_tile_at(&layer, 3, 0, false).expect("tile");
        assert_eq!((moved.x, moved.y), (3, 0));
    }
}
