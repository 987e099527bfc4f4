//! Collision configuration for a layer's tiles.

use crate::grid::faces::calculate_faces_within;
use crate::grid::query::TileRegion;
use crate::layer::LayerData;
use crate::properties::PropertyValue;
use crate::tile::{CollisionCallback, Tile};

/// Turn all four sides of a tile on, or clear its collision entirely.
pub fn set_tile_collision(tile: &mut Tile, collides: bool) {
    if collides {
        tile.set_collision_all(true);
    } else {
        tile.reset_collision();
    }
}

/// Add or remove `index` from the layer's collide list.
pub fn set_layer_collision_index(layer: &mut LayerData, index: i32, collides: bool) {
    let pos = layer.collide_indexes.iter().position(|&i| i == index);
    match (collides, pos) {
        (true, None) => layer.collide_indexes.push(index),
        (false, Some(p)) => {
            layer.collide_indexes.remove(p);
        }
        _ => {}
    }
}

fn apply_to_tiles(layer: &mut LayerData, collides: bool, recalculate_faces: bool, mut pick: impl FnMut(&Tile) -> bool) {
    for tile in layer.tiles_mut() {
        if pick(&*tile) {
            set_tile_collision(tile, collides);
        }
    }
    if recalculate_faces {
        recalculate_all_faces(layer);
    }
}

pub fn recalculate_all_faces(layer: &mut LayerData) {
    let (w, h) = (layer.width as i32, layer.height as i32);
    calculate_faces_within(layer, 0, 0, w, h);
}

/// Collision for every tile whose index is in `indexes`.
///
/// With `update_layer` the indexes are remembered so tiles placed later collide too.
pub fn set_collision(
    layer: &mut LayerData,
    indexes: &[i32],
    collides: bool,
    recalculate_faces: bool,
    update_layer: bool,
) {
    if update_layer {
        for &index in indexes {
            set_layer_collision_index(layer, index, collides);
        }
    }
    apply_to_tiles(layer, collides, recalculate_faces, |t| indexes.contains(&t.index));
}

/// Like [`set_collision`] for the inclusive range `start..=stop`. A reversed range is a no-op.
pub fn set_collision_between(
    layer: &mut LayerData,
    start: i32,
    stop: i32,
    collides: bool,
    recalculate_faces: bool,
    update_layer: bool,
) {
    if start > stop {
        return;
    }
    if update_layer {
        for index in start..=stop {
            set_layer_collision_index(layer, index, collides);
        }
    }
    apply_to_tiles(layer, collides, recalculate_faces, |t| {
        t.index >= start && t.index <= stop
    });
}

/// Collision for every tile whose index is *not* in `indexes`.
pub fn set_collision_by_exclusion(layer: &mut LayerData, indexes: &[i32], collides: bool, recalculate_faces: bool) {
    apply_to_tiles(layer, collides, recalculate_faces, |t| !indexes.contains(&t.index));
}

/// Collision for tiles carrying a matching property.
///
/// Each `(name, value)` pair is an accepted match; repeat a name to accept
/// several values.
pub fn set_collision_by_property(
    layer: &mut LayerData,
    properties: &[(&str, PropertyValue)],
    collides: bool,
    recalculate_faces: bool,
) {
    apply_to_tiles(layer, collides, recalculate_faces, |t| {
        properties
            .iter()
            .any(|(name, value)| t.properties.get(name) == Some(value))
    });
}

/// Register (or with `None`, clear) a callback for every tile of the given indexes.
pub fn set_tile_index_callback(layer: &mut LayerData, indexes: &[i32], callback: Option<CollisionCallback>) {
    for &index in indexes {
        match &callback {
            Some(cb) => {
                layer.callbacks.insert(index, cb.clone());
            }
            None => {
                layer.callbacks.remove(&index);
            }
        }
    }
}

/// Attach a callback to each tile inside a region.
pub fn set_tile_location_callback(
    layer: &mut LayerData,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    callback: Option<CollisionCallback>,
) {
    let region = TileRegion::clipped(layer, x, y, width, height);
    for (tx, ty) in region.coords() {
        if let Some(Some(tile)) = layer.cell_mut(tx, ty) {
            tile.set_collision_callback(callback.clone());
        }
    }
}

/// The callback physics should run for `tile`: its own first, then the layer's per-index one.
pub fn collision_callback_for<'a>(layer: &'a LayerData, tile: &'a Tile) -> Option<&'a CollisionCallback> {
    tile.collision_callback
        .as_ref()
        .or_else(|| layer.callbacks.get(&tile.index))
}
