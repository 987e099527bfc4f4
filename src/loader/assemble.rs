use crate::loader::json_loader::{properties_from_json, version_string, JsonMap, ParseOptions};
use crate::loader::objects::{parse_image_layers, parse_object_layers};
use crate::loader::tile_layers::parse_tile_layers;
use crate::loader::tilesets::{
    append_collection_tilesets, assign_tile_properties, build_tileset_index, parse_tilesets,
};
use crate::map_data::{MapData, MapFormat, Orientation, RenderOrder};
use log::{debug, warn};

/// Build [`MapData`] from a deserialised document.
///
/// Layers are parsed first, then tilesets; the global index needs the
/// finished tileset list and the property pass needs the index.
pub(crate) fn assemble(j: JsonMap, options: &ParseOptions) -> MapData {
    let mut map = MapData::new(
        options.name.clone(),
        j.width,
        j.height,
        j.tilewidth,
        j.tileheight,
        MapFormat::TiledJson,
    );
    map.infinite = j.infinite;
    map.orientation = Orientation::from_name(&j.orientation);
    map.render_order = match j.renderorder.as_deref() {
        None => RenderOrder::default(),
        Some(name) => RenderOrder::from_name(name).unwrap_or_else(|| {
            warn!("Unknown render order '{name}', using right-down");
            RenderOrder::default()
        }),
    };
    map.version = version_string(&j.version);
    map.properties = properties_from_json(&j.properties);
    map.hex_side_length = j.hexsidelength;
    if let Some(axis) = &j.staggeraxis {
        map.stagger_axis = axis.clone();
    }
    if let Some(index) = &j.staggerindex {
        map.stagger_index = index.clone();
    }

    map.layers = parse_tile_layers(&j, options.insert_null);
    map.images = parse_image_layers(&j);
    map.objects = parse_object_layers(&j);

    let (tilesets, collections) = parse_tilesets(&j);
    map.tilesets = tilesets;
    map.image_collections = collections;
    append_collection_tilesets(&mut map.tilesets, &map.image_collections);
    map.tiles = build_tileset_index(&map.tilesets);

    assign_tile_properties(&mut map);

    debug!(
        "Parsed map '{}': {}x{} tiles, {} tile layers, {} object layers, {} image layers, {} tilesets",
        map.name,
        map.width,
        map.height,
        map.layers.len(),
        map.objects.len(),
        map.images.len(),
        map.tilesets.len()
    );
    map
}

#[cfg(test)]
mod tests {
    use crate::loader::json_loader::{parse_json_tiled, ParseOptions};

    const MAP: &str = r#"{
      "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16, "renderorder": "sideways",
      "layers": [{"name":"ground","width":2,"height":1,"data":[2, 40]}],
      "tilesets": [
        {"name":"big","firstgid":1,"image":"big.png","imagewidth":64,"imageheight":32,
         "tilewidth":32,"tileheight":32,
         "tiles":[{"id":1,"properties":[{"name":"lava","type":"bool","value":true}]}]}
      ]
    }"#;

    #[test]
    fn tiles_take_size_and_properties_from_their_tileset() {
        let map = parse_json_tiled(MAP, &ParseOptions::default()).expect("parse");
        assert_eq!(map.render_order, crate::RenderOrder::RightDown);

        let known = map.layers[0].data[0][0].as_ref().expect("tile");
        assert_eq!((known.width, known.height), (32.0, 32.0));
        assert_eq!(known.properties.get_bool("lava"), Some(true));

        // GID 40 has no tileset: kept with layer defaults
        let unknown = map.layers[0].data[0][1].as_ref().expect("tile");
        assert_eq!(unknown.index, 40);
        assert_eq!((unknown.width, unknown.height), (16.0, 16.0));
        assert!(unknown.properties.is_empty());
    }

    #[test]
    fn parsing_twice_gives_the_same_result() {
        let a = parse_json_tiled(MAP, &ParseOptions::default()).expect("parse");
        let b = parse_json_tiled(MAP, &ParseOptions::default()).expect("parse");
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.tilesets.len(), b.tilesets.len());
        assert_eq!(a.layers[0].name, b.layers[0].name);
    }
}
