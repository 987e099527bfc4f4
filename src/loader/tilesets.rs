//! Tilesets, image collections and the global tile index.

use crate::loader::json_loader::{
    legacy_properties, properties_from_json, JsonMap, JsonTile, JsonTileset, JsonTilesetTiles,
};
use crate::loader::objects::parse_object;
use crate::map_data::{MapData, TileIndex};
use crate::tileset::{AnimationFrame, ImageCollection, ObjectGroup, TileData, Tileset};
use crate::gid::GID_MASK;
use log::warn;
use macroquad::prelude::vec2;

fn tile_data(tile: &JsonTile) -> Option<TileData> {
    let type_name = tile.kind.clone().or_else(|| tile.class.clone());
    if tile.objectgroup.is_none() && tile.animation.is_empty() && type_name.is_none() {
        return None;
    }

    Some(TileData {
        object_group: tile.objectgroup.as_ref().map(|g| ObjectGroup {
            name: g.name.clone(),
            objects: g.objects.iter().map(|o| parse_object(o, 0.0, 0.0)).collect(),
        }),
        animation: tile
            .animation
            .iter()
            .map(|f| AnimationFrame {
                tile_id: f.tileid,
                duration: f.duration,
            })
            .collect(),
        type_name,
    })
}

/// `(local id, record)` pairs from either tile record layout.
fn tile_records(tiles: &JsonTilesetTiles) -> Vec<(u32, &JsonTile)> {
    match tiles {
        JsonTilesetTiles::List(list) => list.iter().map(|t| (t.id, t)).collect(),
        JsonTilesetTiles::Legacy(map) => map
            .iter()
            .filter_map(|(key, t)| match key.trim().parse::<u32>() {
                Ok(id) => Some((id, t)),
                Err(_) => {
                    warn!("Skipping tile record with non-numeric id '{key}'");
                    None
                }
            })
            .collect(),
    }
}

fn build_tileset(set: &JsonTileset) -> Tileset {
    let mut ts = Tileset::new(
        set.name.clone(),
        set.firstgid,
        set.tilewidth,
        set.tileheight,
        set.margin,
        set.spacing,
    );
    if let Some(offset) = set.tileoffset {
        ts.tile_offset = vec2(offset.x, offset.y);
    }

    for (key, props) in &set.tileproperties {
        match key.trim().parse::<u32>() {
            Ok(id) => {
                ts.tile_properties.insert(id, legacy_properties(props));
            }
            Err(_) => warn!("Skipping tile properties with non-numeric id '{key}'"),
        }
    }

    if let Some(tiles) = &set.tiles {
        for (id, tile) in tile_records(tiles) {
            let props = properties_from_json(&tile.properties);
            if !props.is_empty() {
                ts.tile_properties.entry(id).or_default().extend_from(&props);
            }
            if let Some(data) = tile_data(tile) {
                ts.tile_data.insert(id, data);
            }
        }
    }

    ts.update_tile_data(set.imagewidth, set.imageheight);
    ts
}

fn build_collection(set: &JsonTileset) -> ImageCollection {
    let mut collection = ImageCollection::new(
        set.name.clone(),
        set.firstgid,
        set.tilewidth,
        set.tileheight,
        set.margin,
        set.spacing,
        properties_from_json(&set.properties),
    );

    let mut max_id = 0;
    if let Some(tiles) = &set.tiles {
        for (id, tile) in tile_records(tiles) {
            let Some(image) = &tile.image else {
                warn!("Image collection '{}' tile {id} has no image", set.name);
                continue;
            };
            match set.firstgid.checked_add(id).filter(|&gid| gid <= GID_MASK) {
                Some(gid) => {
                    collection.add_image(gid, image.clone());
                    max_id = max_id.max(id);
                }
                None => warn!("Image collection '{}' tile {id} is outside the GID range", set.name),
            }
        }
    }
    collection.max_id = max_id;
    collection
}

#[derive(Clone, Copy)]
enum Built {
    Tileset(usize),
    Collection(usize),
    Skipped,
}

/// Sliced tilesets and image collections, in document order.
///
/// Each record's `last_gid` is set to the GID just before the next entry
/// in the document, external entries included.
pub(crate) fn parse_tilesets(j: &JsonMap) -> (Vec<Tileset>, Vec<ImageCollection>) {
    let mut tilesets: Vec<Tileset> = Vec::new();
    let mut collections: Vec<ImageCollection> = Vec::new();
    let mut last = Built::Skipped;

    for set in &j.tilesets {
        let last_gid = Some(set.firstgid.saturating_sub(1));
        match last {
            Built::Tileset(i) => tilesets[i].last_gid = last_gid,
            Built::Collection(i) => collections[i].last_gid = last_gid,
            Built::Skipped => {}
        }

        last = if set.source.as_deref().is_some_and(|s| !s.is_empty()) {
            warn!("External tilesets unsupported. Use Embed Tileset and re-export");
            Built::Skipped
        } else if set.image.as_deref().is_some_and(|s| !s.is_empty()) {
            tilesets.push(build_tileset(set));
            Built::Tileset(tilesets.len() - 1)
        } else {
            collections.push(build_collection(set));
            Built::Collection(collections.len() - 1)
        };
    }

    (tilesets, collections)
}

/// Give every collection image its own one-tile tileset so the global
/// index can address it.
pub(crate) fn append_collection_tilesets(tilesets: &mut Vec<Tileset>, collections: &[ImageCollection]) {
    for collection in collections {
        for image in &collection.images {
            let mut ts = Tileset::new(
                image.image.clone(),
                image.gid,
                collection.image_width,
                collection.image_height,
                0,
                0,
            );
            ts.update_tile_data(collection.image_width, collection.image_height);
            tilesets.push(ts);
        }
    }
}

/// GID → atlas position and tileset, one range per tileset.
///
/// Where ranges overlap the set with the higher `first_gid` wins.
pub(crate) fn build_tileset_index(tilesets: &[Tileset]) -> TileIndex {
    TileIndex::from_tilesets(tilesets)
}

/// Copy tileset tile size and declared properties onto every placed tile.
pub(crate) fn assign_tile_properties(map: &mut MapData) {
    let MapData {
        layers,
        tilesets,
        tiles: index,
        ..
    } = map;

    for layer in layers.iter_mut() {
        let mut unknown = 0usize;
        for tile in layer.tiles_mut().filter(|t| t.index >= 0) {
            let Some(entry) = index.get(tile.index as i64) else {
                unknown += 1;
                continue;
            };
            let Some(set) = tilesets.get(entry.tileset_index) else {
                continue;
            };
            tile.width = set.tile_width as f32;
            tile.height = set.tile_height as f32;
            if let Some(props) = set.get_tile_properties(tile.index as i64) {
                tile.properties.extend_from(props);
            }
        }
        if unknown > 0 {
            warn!(
                "Layer '{}' references {unknown} tile(s) with no tileset",
                layer.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(json: &str) -> JsonMap {
        serde_json::from_str(json).expect("map")
    }

    #[test]
    fn new_and_legacy_tile_records() {
        let j = map(
            r#"{
              "tilesets": [
                {"name":"new","firstgid":1,"image":"a.png","imagewidth":32,"imageheight":16,
                 "tilewidth":16,"tileheight":16,"tileoffset":{"x":2,"y":-4},
                 "tiles":[
                   {"id":1,"type":"wall","properties":[{"name":"solid","type":"bool","value":true}],
                    "animation":[{"tileid":0,"duration":100},{"tileid":1,"duration":50}],
                    "objectgroup":{"name":"hit","objects":[{"id":1,"x":0,"y":0,"width":16,"height":8}]}}
                 ]},
                {"name":"old","firstgid":3,"image":"b.png","imagewidth":16,"imageheight":16,
                 "tilewidth":16,"tileheight":16,
                 "tileproperties":{"0":{"slippery":true}},
                 "tiles":{"0":{"animation":[{"tileid":0,"duration":10}]}}},
                {"name":"ext","firstgid":9,"source":"ext.tsj"}
              ]
            }"#,
        );

        let (tilesets, collections) = parse_tilesets(&j);
        assert_eq!(tilesets.len(), 2);
        assert!(collections.is_empty());

        let new = &tilesets[0];
        assert_eq!(new.total, 2);
        assert_eq!(new.tile_offset, vec2(2.0, -4.0));
        assert_eq!(new.get_tile_properties(2).and_then(|p| p.get_bool("solid")), Some(true));
        let data = new.get_tile_data(2).expect("tile data");
        assert_eq!(data.type_name.as_deref(), Some("wall"));
        assert_eq!(data.animation.len(), 2);
        assert_eq!(data.animation[1].duration, 50);
        let group = new.get_tile_collision_group(2).expect("collision group");
        assert_eq!(group.objects.len(), 1);
        assert_eq!(group.objects[0].height, 8.0);
        assert!(new.get_tile_data(1).is_none());

        let old = &tilesets[1];
        assert_eq!(old.get_tile_properties(3).and_then(|p| p.get_bool("slippery")), Some(true));
        assert_eq!(old.get_tile_data(3).map(|d| d.animation.len()), Some(1));
    }

    #[test]
    fn image_collections_get_one_tile_sets() {
        let j = map(
            r#"{
              "tilesets": [
                {"name":"atlas","firstgid":1,"image":"a.png","imagewidth":32,"imageheight":32,
                 "tilewidth":16,"tileheight":16},
                {"name":"props","firstgid":5,"tilewidth":48,"tileheight":64,
                 "tiles":[{"id":0,"image":"tree.png"},{"id":3,"image":"rock.png"}]}
              ]
            }"#,
        );
        let (mut tilesets, collections) = parse_tilesets(&j);
        assert_eq!(collections.len(), 1);
        let props = &collections[0];
        assert_eq!(props.total, 2);
        assert_eq!(props.max_id, 3);
        assert!(props.contains_image_index(6));
        assert_eq!(props.images[1].gid, 8);

        append_collection_tilesets(&mut tilesets, &collections);
        assert_eq!(tilesets.len(), 3);
        assert_eq!(tilesets[2].name, "rock.png");
        assert_eq!((tilesets[2].first_gid, tilesets[2].total), (8, 1));

        let index = build_tileset_index(&tilesets);
        assert_eq!(index.get(8).map(|e| e.tileset_index), Some(2));
        assert_eq!(index.get(5).map(|e| e.tileset_index), Some(1));
        assert!(index.get(6).is_none());
    }

    #[test]
    fn last_gid_marks_the_next_entry() {
        let j = map(
            r#"{
              "tilesets": [
                {"name":"a","firstgid":1,"image":"a.png","imagewidth":32,"imageheight":16,
                 "tilewidth":16,"tileheight":16},
                {"name":"props","firstgid":3,"tiles":[{"id":0,"image":"tree.png"}]},
                {"name":"ext","firstgid":10,"source":"ext.tsj"},
                {"name":"b","firstgid":20,"image":"b.png","imagewidth":16,"imageheight":16,
                 "tilewidth":16,"tileheight":16}
              ]
            }"#,
        );
        let (tilesets, collections) = parse_tilesets(&j);
        assert_eq!(tilesets[0].last_gid, Some(2));
        assert_eq!(collections[0].last_gid, Some(9));
        assert_eq!(tilesets[1].last_gid, None);
    }

    #[test]
    fn huge_sets_do_not_overflow() {
        let j = map(
            r#"{
              "tilesets": [
                {"name":"big","firstgid":1,"image":"big.png","imagewidth":70000,"imageheight":70000,
                 "tilewidth":1,"tileheight":1},
                {"name":"props","firstgid":4294967295,"tiles":[{"id":0,"image":"a.png"},{"id":5,"image":"b.png"}]}
              ]
            }"#,
        );
        let (mut tilesets, collections) = parse_tilesets(&j);
        assert_eq!(tilesets[0].total, GID_MASK);
        assert!(collections[0].images.is_empty());
        append_collection_tilesets(&mut tilesets, &collections);
        let index = build_tileset_index(&tilesets);
        assert_eq!(index.get(GID_MASK as i64).map(|e| e.tileset_index), Some(0));
    }

    #[test]
    fn index_walks_atlas_row_major() {
        let mut ts = Tileset::new("t", 1, 16, 16, 1, 2);
        ts.update_tile_data(1 + 16 + 2 + 16 + 1, 1 + 16 + 2 + 16 + 1);
        let index = build_tileset_index(std::slice::from_ref(&ts));
        assert_eq!(index.len(), 1);
        assert!(index.get(0).is_none());
        assert!(index.get(5).is_none());
        let cells: Vec<(u32, u32)> = (1..5)
            .map(|gid| index.get(gid).map(|e| (e.atlas_x, e.atlas_y)).expect("entry"))
            .collect();
        assert_eq!(cells, vec![(1, 1), (19, 1), (1, 19), (19, 19)]);
    }
}
