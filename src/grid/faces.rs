//! Interesting-face precomputation.
//!
//! A face of a solid tile is interesting when the neighbour across it is
//! missing or not solid. Edges shared by two solid tiles are never
//! interesting, so physics can skip them.

use crate::grid::query::{get_tile_at, get_tile_at_mut, TileRegion};
use crate::layer::LayerData;

#[inline]
fn solid_at(layer: &LayerData, x: i32, y: i32) -> bool {
    get_tile_at(layer, x, y, true).is_some_and(|t| t.collides())
}

/// Recompute faces for every tile in the region.
///
/// Only tiles inside the region are written. After a collision change at
/// one cell, recompute at least the cell grown by one tile on each side so
/// the neighbours see it too.
pub fn calculate_faces_within(layer: &mut LayerData, x: i32, y: i32, width: i32, height: i32) {
    let region = TileRegion::clipped(layer, x, y, width, height);
    for (tx, ty) in region.coords() {
        let Some(collides) = get_tile_at(layer, tx, ty, true).map(|t| t.collides()) else {
            continue;
        };

        let faces = collides.then(|| {
            (
                !solid_at(layer, tx, ty - 1),
                !solid_at(layer, tx, ty + 1),
                !solid_at(layer, tx - 1, ty),
                !solid_at(layer, tx + 1, ty),
            )
        });

        if let Some(tile) = get_tile_at_mut(layer, tx, ty, true) {
            match faces {
                Some((top, bottom, left, right)) => {
                    tile.face_top = top;
                    tile.face_bottom = bottom;
                    tile.face_left = left;
                    tile.face_right = right;
                }
                None => {
                    tile.reset_faces();
                }
            }
        }
    }
}

/// Recompute faces of the tile at `(x, y)` and the facing sides of its
/// four solid neighbours.
pub fn calculate_faces_at(layer: &mut LayerData, x: i32, y: i32) {
    let tile_collides = solid_at(layer, x, y);

    if tile_collides {
        let top = !solid_at(layer, x, y - 1);
        let bottom = !solid_at(layer, x, y + 1);
        let left = !solid_at(layer, x - 1, y);
        let right = !solid_at(layer, x + 1, y);
        if let Some(tile) = get_tile_at_mut(layer, x, y, true) {
            tile.face_top = top;
            tile.face_bottom = bottom;
            tile.face_left = left;
            tile.face_right = right;
        }
    } else if let Some(tile) = get_tile_at_mut(layer, x, y, true) {
        tile.reset_faces();
    }

    if let Some(above) = get_tile_at_mut(layer, x, y - 1, true).filter(|t| t.collides()) {
        above.face_bottom = !tile_collides;
    }
    if let Some(below) = get_tile_at_mut(layer, x, y + 1, true).filter(|t| t.collides()) {
        below.face_top = !tile_collides;
    }
    if let Some(left) = get_tile_at_mut(layer, x - 1, y, true).filter(|t| t.collides()) {
        left.face_right = !tile_collides;
    }
    if let Some(right) = get_tile_at_mut(layer, x + 1, y, true).filter(|t| t.collides()) {
        right.face_left = !tile_collides;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    fn solid_grid(solid: &[&[bool]]) -> LayerData {
        let mut layer = LayerData::new("f", solid[0].len(), solid.len(), 8.0, 8.0);
        layer.data = solid
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .map(|(x, &s)| {
                        let mut t = Tile::new(1, x as i32, y as i32, 8.0, 8.0);
                        t.set_collision_all(s);
                        Some(t)
                    })
                    .collect()
            })
            .collect();
        layer
    }

    fn faces(layer: &LayerData, x: i32, y: i32) -> (bool, bool, bool, bool) {
        let t = get_tile_at(layer, x, y, true).expect("tile");
        (t.face_top, t.face_bottom, t.face_left, t.face_right)
    }

    #[test]
    fn fully_surrounded_tile_has_no_faces() {
        let mut layer = solid_grid(&[
            &[false, true, false],
            &[true, true, true],
            &[false, true, false],
        ]);
        calculate_faces_within(&mut layer, 0, 0, 3, 3);
        assert_eq!(faces(&layer, 1, 1), (false, false, false, false));
        assert_eq!(faces(&layer, 1, 0), (true, false, true, true));
        assert_eq!(faces(&layer, 0, 0), (false, false, false, false));
    }

    #[test]
    fn map_edges_count_as_open() {
        let mut layer = solid_grid(&[&[true]]);
        calculate_faces_within(&mut layer, 0, 0, 1, 1);
        assert_eq!(faces(&layer, 0, 0), (true, true, true, true));
    }

    #[test]
    fn shared_edges_are_never_both_interesting() {
        let mut layer = solid_grid(&[
            &[true, true, false, true],
            &[false, true, true, true],
            &[true, false, true, false],
        ]);
        calculate_faces_within(&mut layer, 0, 0, 4, 3);
        for y in 0..3 {
            for x in 0..4 {
                let t = get_tile_at(&layer, x, y, true).expect("tile");
                if let Some(r) = get_tile_at(&layer, x + 1, y, true) {
                    if t.collides() && r.collides() {
                        assert!(!t.face_right && !r.face_left, "({x},{y}) right");
                    }
                }
                if let Some(b) = get_tile_at(&layer, x, y + 1, true) {
                    if t.collides() && b.collides() {
                        assert!(!t.face_bottom && !b.face_top, "({x},{y}) down");
                    }
                }
            }
        }
    }

    #[test]
    fn recomputing_is_idempotent() {
        let mut layer = solid_grid(&[&[true, false], &[true, true]]);
        calculate_faces_within(&mut layer, 0, 0, 2, 2);
        let first: Vec<_> = (0..4).map(|i| faces(&layer, i % 2, i / 2)).collect();
        calculate_faces_within(&mut layer, 0, 0, 2, 2);
        let second: Vec<_> = (0..4).map(|i| faces(&layer, i % 2, i / 2)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn single_cell_update_fixes_neighbours() {
        let mut layer = solid_grid(&[&[true, false, true]]);
        calculate_faces_within(&mut layer, 0, 0, 3, 1);
        assert!(faces(&layer, 0, 0).3);

        if let Some(t) = get_tile_at_mut(&mut layer, 1, 0, true) {
            t.set_collision_all(true);
        }
        calculate_faces_at(&mut layer, 1, 0);
        assert!(!faces(&layer, 0, 0).3);
        assert!(!faces(&layer, 2, 0).2);
        assert_eq!(faces(&layer, 1, 0), (true, true, false, false));

        if let Some(t) = get_tile_at_mut(&mut layer, 1, 0, true) {
            t.reset_collision();
        }
        calculate_faces_at(&mut layer, 1, 0);
        assert!(faces(&layer, 0, 0).3);
        assert!(faces(&layer, 2, 0).2);
        assert_eq!(faces(&layer, 1, 0), (false, false, false, false));
    }
}
