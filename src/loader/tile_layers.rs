//! Tile layer parsing: finite grids and chunked infinite layers.

use crate::gid::parse_gid;
use crate::layer::{empty_cell, Cell, LayerData};
use crate::loader::groups::{flatten_layers, GroupState, LayerKind};
use crate::loader::json_loader::{properties_from_json, JsonLayer, JsonMap, JsonTileData};
use crate::map_data::Orientation;
use crate::tile::Tile;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::warn;
use std::borrow::Cow;

/// Decode uncompressed base64 tile data into little-endian `u32` GIDs.
///
/// Trailing bytes that do not make up a whole GID are dropped.
pub fn decode_base64_gids(data: &str) -> Result<Vec<u32>, base64::DecodeError> {
    let bytes = STANDARD.decode(data.trim())?;
    Ok(bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn gids<'a>(data: &'a JsonTileData, base64: bool, layer: &str) -> Option<Cow<'a, [u32]>> {
    match data {
        JsonTileData::Gids(v) => Some(Cow::Borrowed(v.as_slice())),
        JsonTileData::Encoded(s) if base64 => match decode_base64_gids(s) {
            Ok(v) => Some(Cow::Owned(v)),
            Err(e) => {
                warn!("Layer '{layer}' has invalid base64 tile data: {e}");
                None
            }
        },
        JsonTileData::Encoded(_) => {
            warn!("Layer '{layer}' has string tile data without base64 encoding");
            None
        }
    }
}

fn cell_from_gid(raw: u32, x: i32, y: i32, tw: f32, th: f32, insert_null: bool) -> Cell {
    let info = parse_gid(raw);
    if info.gid == 0 {
        return empty_cell(insert_null, x, y, tw, th);
    }
    let mut tile = Tile::new(info.gid as i32, x, y, tw, th);
    tile.rotation = info.rotation;
    tile.flip_x = info.flipped;
    Some(tile)
}

fn layer_shell(j: &JsonMap, layer: &JsonLayer, group: &GroupState, x: f32, y: f32) -> LayerData {
    let mut out = LayerData::new(
        format!("{}{}", group.name, layer.name),
        layer.width,
        layer.height,
        j.tilewidth,
        j.tileheight,
    );
    out.id = layer.id;
    out.x = x;
    out.y = y;
    out.alpha = group.opacity * layer.opacity;
    out.visible = group.visible && layer.visible;
    out.properties = properties_from_json(&layer.properties);
    out.orientation = Orientation::from_name(&j.orientation);
    out.hex_side_length = j.hexsidelength;
    if let Some(axis) = &j.staggeraxis {
        out.stagger_axis = axis.clone();
    }
    if let Some(index) = &j.staggerindex {
        out.stagger_index = index.clone();
    }
    out
}

fn parse_finite(j: &JsonMap, layer: &JsonLayer, group: &GroupState, insert_null: bool) -> Option<LayerData> {
    let x = group.x + layer.offsetx + layer.x;
    let y = group.y + layer.offsety + layer.y;
    let mut out = layer_shell(j, layer, group, x, y);

    let data = match &layer.data {
        Some(d) => gids(d, layer.is_base64(), &layer.name)?,
        None => Cow::Borrowed(&[][..]),
    };

    let expected = layer.width.saturating_mul(layer.height);
    if data.len() != expected {
        warn!(
            "Layer '{}' has {} tiles, expected {expected}",
            layer.name,
            data.len()
        );
    }

    let (tw, th) = (j.tilewidth, j.tileheight);
    out.data = (0..layer.height)
        .map(|ty| {
            (0..layer.width)
                .map(|tx| {
                    let (cx, cy) = (tx as i32, ty as i32);
                    match data.get(ty * layer.width + tx) {
                        Some(&raw) => cell_from_gid(raw, cx, cy, tw, th, insert_null),
                        None => empty_cell(insert_null, cx, cy, tw, th),
                    }
                })
                .collect()
        })
        .collect();
    Some(out)
}

fn parse_chunked(j: &JsonMap, layer: &JsonLayer, group: &GroupState, insert_null: bool) -> Option<LayerData> {
    let origin_x = layer.startx.saturating_add(layer.x as i32);
    let origin_y = layer.starty.saturating_add(layer.y as i32);
    let x = group.x + layer.offsetx + origin_x as f32 * j.tilewidth;
    let y = group.y + layer.offsety + origin_y as f32 * j.tileheight;
    let mut out = layer_shell(j, layer, group, x, y);
    out.fill_empty(insert_null);

    let (tw, th) = (j.tilewidth, j.tileheight);
    let mut dropped = 0usize;
    for chunk in &layer.chunks {
        if chunk.width == 0 {
            continue;
        }
        let Some(data) = gids(&chunk.data, layer.is_base64(), &layer.name) else {
            warn!(
                "Layer '{}' skipping chunk at ({}, {})",
                layer.name, chunk.x, chunk.y
            );
            continue;
        };
        if data.len() != chunk.width.saturating_mul(chunk.height) {
            warn!(
                "Layer '{}' chunk at ({}, {}) has {} tiles, expected {}",
                layer.name,
                chunk.x,
                chunk.y,
                data.len(),
                chunk.width.saturating_mul(chunk.height)
            );
        }
        let offset_x = chunk.x as i64 - origin_x as i64;
        let offset_y = chunk.y as i64 - origin_y as i64;

        for (t, &raw) in data.iter().enumerate() {
            let tx = i32::try_from((t % chunk.width) as i64 + offset_x);
            let ty = i32::try_from((t / chunk.width) as i64 + offset_y);
            match (tx, ty) {
                (Ok(tx), Ok(ty)) => match out.cell_mut(tx, ty) {
                    Some(cell) => *cell = cell_from_gid(raw, tx, ty, tw, th, insert_null),
                    None => dropped += 1,
                },
                _ => dropped += 1,
            }
        }
    }
    if dropped > 0 {
        warn!(
            "Layer '{}' has {dropped} chunk cell(s) outside its bounds",
            layer.name
        );
    }
    Some(out)
}

/// Every tile layer in editor order, group state resolved.
pub(crate) fn parse_tile_layers(j: &JsonMap, insert_null: bool) -> Vec<LayerData> {
    flatten_layers(&j.layers, LayerKind::Tile, j.tilewidth, j.tileheight)
        .into_iter()
        .filter_map(|(layer, group)| {
            if layer.is_compressed() {
                warn!(
                    "Layer compression is unsupported, skipping layer '{}'",
                    layer.name
                );
                return None;
            }
            if j.infinite {
                parse_chunked(j, layer, &group, insert_null)
            } else {
                parse_finite(j, layer, &group, insert_null)
            }
        })
        .collect()
}
