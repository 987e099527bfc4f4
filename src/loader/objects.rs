//! Object and image layer parsing.

use crate::gid::parse_gid;
use crate::loader::groups::{flatten_layers, LayerKind};
use crate::loader::json_loader::{properties_from_json, JsonMap, JsonObject, JsonPoint, JsonText};
use crate::map_data::ImageLayer;
use crate::object::{MapObject, ObjectLayer, ObjectShape, TextData};
use macroquad::prelude::{vec2, Vec2};

fn points(src: &[JsonPoint]) -> Vec<Vec2> {
    src.iter().map(|p| vec2(p.x, p.y)).collect()
}

fn text_data(t: &JsonText) -> TextData {
    TextData {
        text: t.text.clone(),
        font_family: t.fontfamily.clone(),
        pixel_size: t.pixelsize,
        wrap: t.wrap,
        color: t.color.clone(),
        bold: t.bold,
        italic: t.italic,
        underline: t.underline,
        strikeout: t.strikeout,
        kerning: t.kerning,
        halign: t.halign.clone(),
        valign: t.valign.clone(),
    }
}

fn shape_of(obj: &JsonObject) -> ObjectShape {
    if let Some(raw) = obj.gid.filter(|&g| g != 0) {
        let info = parse_gid(raw);
        ObjectShape::Tile {
            gid: info.gid,
            flipped_horizontal: info.flipped_horizontal,
            flipped_vertical: info.flipped_vertical,
            flipped_anti_diagonal: info.flipped_anti_diagonal,
        }
    } else if let Some(line) = &obj.polyline {
        ObjectShape::Polyline(points(line))
    } else if let Some(poly) = &obj.polygon {
        ObjectShape::Polygon(points(poly))
    } else if obj.ellipse {
        ObjectShape::Ellipse
    } else if let Some(text) = &obj.text {
        ObjectShape::Text(text_data(text))
    } else if obj.point {
        ObjectShape::Point
    } else {
        ObjectShape::Rectangle
    }
}

/// Normalise one editor object, shifting it by the owning layer offset.
pub(crate) fn parse_object(obj: &JsonObject, offset_x: f32, offset_y: f32) -> MapObject {
    let type_name = if obj.kind.is_empty() {
        obj.class.clone()
    } else {
        obj.kind.clone()
    };

    MapObject {
        id: obj.id,
        name: obj.name.clone(),
        type_name,
        rotation: obj.rotation,
        properties: properties_from_json(&obj.properties),
        visible: obj.visible,
        x: obj.x + offset_x,
        y: obj.y + offset_y,
        width: obj.width,
        height: obj.height,
        shape: shape_of(obj),
    }
}

pub(crate) fn parse_object_layers(j: &JsonMap) -> Vec<ObjectLayer> {
    flatten_layers(&j.layers, LayerKind::Object, j.tilewidth, j.tileheight)
        .into_iter()
        .map(|(layer, group)| {
            let offset_x = group.x + layer.startx as f32 + layer.offsetx;
            let offset_y = group.y + layer.starty as f32 + layer.offsety;
            ObjectLayer {
                name: format!("{}{}", group.name, layer.name),
                opacity: group.opacity * layer.opacity,
                properties: properties_from_json(&layer.properties),
                type_name: layer.kind().to_owned(),
                visible: group.visible && layer.visible,
                objects: layer
                    .objects
                    .iter()
                    .map(|o| parse_object(o, offset_x, offset_y))
                    .collect(),
            }
        })
        .collect()
}

pub(crate) fn parse_image_layers(j: &JsonMap) -> Vec<ImageLayer> {
    flatten_layers(&j.layers, LayerKind::Image, j.tilewidth, j.tileheight)
        .into_iter()
        .map(|(layer, group)| ImageLayer {
            name: format!("{}{}", group.name, layer.name),
            image: layer.image.clone(),
            x: group.x + layer.offsetx + layer.startx as f32 + layer.x,
            y: group.y + layer.offsety + layer.starty as f32 + layer.y,
            alpha: group.opacity * layer.opacity,
            visible: group.visible && layer.visible,
            properties: properties_from_json(&layer.properties),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(json: &str) -> MapObject {
        let raw: JsonObject = serde_json::from_str(json).expect("object");
        parse_object(&raw, 0.0, 0.0)
    }

    #[test]
    fn shape_precedence() {
        let o = object(r#"{"gid":2147483653,"polyline":[{"x":0,"y":0}]}"#);
        assert_eq!(
            o.shape,
            ObjectShape::Tile {
                gid: 5,
                flipped_horizontal: true,
                flipped_vertical: false,
                flipped_anti_diagonal: false
            }
        );
        assert_eq!(o.gid(), Some(5));

        let o = object(r#"{"gid":0,"polyline":[{"x":1,"y":2}],"polygon":[]}"#);
        assert_eq!(o.shape, ObjectShape::Polyline(vec![vec2(1.0, 2.0)]));

        let o = object(r#"{"polygon":[],"ellipse":true}"#);
        assert_eq!(o.shape, ObjectShape::Polygon(vec![]));

        let o = object(r#"{"ellipse":true,"point":true}"#);
        assert_eq!(o.shape, ObjectShape::Ellipse);

        let o = object(r#"{"text":{"text":"hi","bold":true},"point":true}"#);
        match o.shape {
            ObjectShape::Text(t) => {
                assert_eq!(t.text, "hi");
                assert!(t.bold);
                assert_eq!(t.pixel_size, 16);
            }
            other => panic!("expected text, got {other:?}"),
        }

        assert_eq!(object(r#"{"point":true}"#).shape, ObjectShape::Point);
        assert_eq!(object(r#"{}"#).shape, ObjectShape::Rectangle);
    }

    #[test]
    fn type_falls_back_to_class() {
        assert_eq!(object(r#"{"class":"door"}"#).type_name, "door");
        assert_eq!(object(r#"{"type":"chest","class":"door"}"#).type_name, "chest");
    }

    #[test]
    fn layers_inherit_group_offset_and_alpha() {
        let j: JsonMap = serde_json::from_str(
            r#"{
              "tilewidth": 16, "tileheight": 16,
              "layers": [
                {"type":"group","name":"g","offsetx":100,"offsety":50,"opacity":0.5,"visible":false,"layers":[
                  {"type":"objectgroup","name":"spawns","offsetx":4,"opacity":0.5,
                   "objects":[{"id":1,"name":"p","x":10,"y":10,"point":true}]},
                  {"type":"imagelayer","name":"sky","image":"sky.png","x":2,"offsety":3,"opacity":0.8}
                ]}
              ]
            }"#,
        )
        .expect("map");

        let objects = parse_object_layers(&j);
        assert_eq!(objects.len(), 1);
        let layer = &objects[0];
        assert_eq!(layer.name, "g/spawns");
        assert_eq!(layer.opacity, 0.25);
        assert!(!layer.visible);
        assert_eq!(layer.type_name, "objectgroup");
        let p = layer.find(|o| o.name == "p").expect("object");
        assert_eq!((p.x, p.y), (114.0, 60.0));

        let images = parse_image_layers(&j);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "g/sky");
        assert_eq!(images[0].image, "sky.png");
        assert_eq!((images[0].x, images[0].y), (102.0, 53.0));
        assert_eq!(images[0].alpha, 0.4);
    }
}
