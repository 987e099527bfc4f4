// tests/scenarios.rs

use std::f32::consts::PI;
use tiled_grid::grid::faces::calculate_faces_within;
use tiled_grid::{
    parse_gid, parse_json_tiled, LayerData, LayerTransform, ParseOptions, Tile, TileId, Tilemap, Tileset, FLIP_D,
    FLIP_H, FLIP_V,
};

fn finite_map(data: &str) -> String {
    format!(
        r#"{{
          "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
          "layers": [{{"name":"ground","width":2,"height":1,"data":{data}}}],
          "tilesets": [{{"name":"t","firstgid":1,"image":"t.png","imagewidth":160,"imageheight":16,
                         "tilewidth":16,"tileheight":16}}]
        }}"#
    )
}

#[test]
fn finite_layer_with_empty_cell() {
    let json = finite_map("[5, 0]");
    let map = parse_json_tiled(&json, &ParseOptions::default()).expect("parse");
    assert_eq!(map.tilesets[0].total, 10);

    let row = &map.layers[0].data[0];
    let first = row[0].as_ref().expect("tile");
    assert_eq!((first.index, first.x, first.y), (5, 0, 0));
    let second = row[1].as_ref().expect("empty tile");
    assert_eq!((second.index, second.x, second.y), (-1, 1, 0));

    let map = parse_json_tiled(&json, &ParseOptions::default().with_insert_null(true)).expect("parse");
    assert!(map.layers[0].data[0][0].is_some());
    assert!(map.layers[0].data[0][1].is_none());
}

#[test]
fn horizontal_flip_only() {
    let info = parse_gid(FLIP_H | 7);
    assert_eq!(info.gid, 7);
    assert!(info.flipped_horizontal);
    assert!(!info.flipped_vertical);
    assert!(!info.flipped_anti_diagonal);
    assert_eq!(info.rotation, 0.0);
    assert!(info.flipped);
}

#[test]
fn flip_bits_round_trip_for_every_combination() {
    for bits in 0..8u32 {
        let raw = (if bits & 1 != 0 { FLIP_H } else { 0 })
            | (if bits & 2 != 0 { FLIP_V } else { 0 })
            | (if bits & 4 != 0 { FLIP_D } else { 0 })
            | 1234;
        let info = parse_gid(raw);
        assert_eq!(info.gid, 1234);
        assert_eq!(info.to_tile_id(), TileId(raw), "bits {bits:03b}");
        assert!((0.0..2.0 * PI).contains(&info.rotation));
    }
}

#[test]
fn group_child_inherits_offset_and_prefix() {
    let json = r#"{
      "width": 1, "height": 1, "tilewidth": 8, "tileheight": 8,
      "layers": [
        {"type":"group","name":"group","offsetx":10,"offsety":20,"layers":[
          {"type":"tilelayer","name":"floor","width":1,"height":1,"offsetx":0,"offsety":0,"data":[0]}
        ]}
      ]
    }"#;
    let map = Tilemap::from_json_str(json, &ParseOptions::default()).expect("parse");
    let floor = map.get_layer("group/floor").expect("flattened layer");
    assert_eq!((floor.x, floor.y), (10.0, 20.0));
}

fn solid_plus() -> LayerData {
    let mut layer = LayerData::new("plus", 3, 3, 8.0, 8.0);
    layer.fill_empty(false);
    for (x, y) in [(1, 1), (1, 0), (1, 2), (0, 1), (2, 1)] {
        if let Some(Some(tile)) = layer.cell_mut(x, y) {
            *tile = Tile::new(1, x, y, 8.0, 8.0);
            tile.set_collision_all(true);
        }
    }
    layer
}

#[test]
fn surrounded_tile_has_no_faces() {
    let mut layer = solid_plus();
    calculate_faces_within(&mut layer, 0, 0, 3, 3);
    let centre = layer.cell(1, 1).and_then(|c| c.as_ref()).expect("tile");
    assert!(!centre.face_top && !centre.face_bottom && !centre.face_left && !centre.face_right);
    assert!(!centre.has_interesting_face());

    let arm = layer.cell(1, 0).and_then(|c| c.as_ref()).expect("tile");
    assert!(arm.face_top && arm.face_left && arm.face_right);
    assert!(!arm.face_bottom);
}

#[test]
fn parsed_layers_are_rectangular() {
    let json = r#"{
      "width": 3, "height": 2, "tilewidth": 8, "tileheight": 8, "infinite": true,
      "layers": [{"name":"inf","width":3,"height":2,"startx":0,"starty":0,
                  "chunks":[{"x":0,"y":0,"width":2,"height":2,"data":[1,2,3,4]}]}]
    }"#;
    let map = parse_json_tiled(json, &ParseOptions::default()).expect("parse");
    let layer = &map.layers[0];
    assert_eq!(layer.data.len(), layer.height);
    assert!(layer.data.iter().all(|row| row.len() == layer.width));
}

#[test]
fn contains_tile_index_boundaries() {
    let mut ts = Tileset::new("t", 10, 16, 16, 0, 0);
    ts.update_tile_data(64, 32);
    assert_eq!(ts.total, 8);
    for gid in 0..30i64 {
        assert_eq!(ts.contains_tile_index(gid), (10..18).contains(&gid), "gid {gid}");
    }
    assert!(!ts.contains_tile_index(9));
    assert!(ts.contains_tile_index(10));
    assert!(ts.contains_tile_index(17));
    assert!(!ts.contains_tile_index(18));
}

#[test]
fn world_tile_round_trip_within_a_tile() {
    let t = LayerTransform::new(
        macroquad::prelude::vec2(-40.0, 12.0),
        macroquad::prelude::vec2(1.5, 2.0),
        macroquad::prelude::vec2(16.0, 16.0),
    );
    let mut px = -40.0;
    while px < 400.0 {
        let tile_x = t.world_to_tile_x(px, true) as i32;
        let back = t.tile_to_world_x(tile_x);
        assert!(back <= px && px - back < 16.0 * 1.5, "px {px} back {back}");
        px += 7.25;
    }
}
