use crate::properties::Properties;
use macroquad::prelude::Vec2;

/// Text payload of a text object.
#[derive(Debug, Clone, PartialEq)]
pub struct TextData {
    pub text: String,
    pub font_family: String,
    pub pixel_size: u32,
    pub wrap: bool,
    /// `#AARRGGBB` or `#RRGGBB` as authored.
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub kerning: bool,
    pub halign: String,
    pub valign: String,
}

impl Default for TextData {
    fn default() -> Self {
        TextData {
            text: String::new(),
            font_family: "sans-serif".to_owned(),
            pixel_size: 16,
            wrap: false,
            color: "#000000".to_owned(),
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            kerning: true,
            halign: "left".to_owned(),
            valign: "top".to_owned(),
        }
    }
}

/// Type-specific part of a [`MapObject`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    /// A tile placed as an object.
    Tile {
        gid: u32,
        flipped_horizontal: bool,
        flipped_vertical: bool,
        flipped_anti_diagonal: bool,
    },
    /// Points relative to the object position.
    Polyline(Vec<Vec2>),
    /// Points relative to the object position.
    Polygon(Vec<Vec2>),
    Ellipse,
    Text(TextData),
    Point,
    Rectangle,
}

/// A parsed object with the common fields every kind shares.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    /// `type`, or `class` for newer exports.
    pub type_name: String,
    pub rotation: f32,
    pub properties: Properties,
    pub visible: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub shape: ObjectShape,
}

impl MapObject {
    pub fn gid(&self) -> Option<u32> {
        match self.shape {
            ObjectShape::Tile { gid, .. } => Some(gid),
            _ => None,
        }
    }
}

/// A flattened object layer.
#[derive(Debug, Clone)]
pub struct ObjectLayer {
    /// Prefixed with the owning group path.
    pub name: String,
    pub opacity: f32,
    pub properties: Properties,
    pub type_name: String,
    pub visible: bool,
    pub objects: Vec<MapObject>,
}

impl ObjectLayer {
    pub fn find(&self, mut predicate: impl FnMut(&MapObject) -> bool) -> Option<&MapObject> {
        self.objects.iter().find(|o| predicate(o))
    }

    pub fn filter(&self, mut predicate: impl FnMut(&MapObject) -> bool) -> Vec<&MapObject> {
        self.objects.iter().filter(|o| predicate(o)).collect()
    }
}
