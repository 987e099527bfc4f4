// src/loader/json_loader.rs
use crate::error::MapError;
use crate::loader::assemble::assemble;
use crate::map_data::MapData;
use crate::properties::{Properties, PropertyValue};
use log::warn;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::Path;

/// Knobs for turning a Tiled document into [`MapData`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Name given to the resulting map.
    pub name: String,
    /// Store empty cells as `None` instead of index `-1` tiles.
    pub insert_null: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            name: "map".to_owned(),
            insert_null: false,
        }
    }
}

impl ParseOptions {
    /// Default options with a custom map name.
    pub fn named(name: impl Into<String>) -> Self {
        ParseOptions {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder form of `insert_null`.
    pub fn with_insert_null(mut self, insert_null: bool) -> Self {
        self.insert_null = insert_null;
        self
    }
}

pub(crate) fn default_true() -> bool {
    true
}
pub(crate) fn one() -> f32 {
    1.0
}

/// Plain GID array, or a base64 string when `encoding` says so.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum JsonTileData {
    Gids(Vec<u32>),
    Encoded(String),
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonChunk {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    pub data: JsonTileData,
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonLayer {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    #[serde(default)]
    pub offsetx: f32,
    #[serde(default)]
    pub offsety: f32,
    #[serde(default)]
    pub startx: i32,
    #[serde(default)]
    pub starty: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default)]
    pub properties: JsonProperties,
    #[serde(default)]
    pub data: Option<JsonTileData>,
    #[serde(default)]
    pub chunks: Vec<JsonChunk>,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub objects: Vec<JsonObject>,
    #[serde(default)]
    pub image: String,
    /// Children of a `group` layer.
    #[serde(default)]
    pub layers: Vec<JsonLayer>,
}

impl JsonLayer {
    /// `tilelayer` when the export leaves `type` out.
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("tilelayer")
    }

    pub fn is_compressed(&self) -> bool {
        self.compression.as_deref().is_some_and(|c| !c.is_empty())
    }

    pub fn is_base64(&self) -> bool {
        self.encoding.as_deref() == Some("base64")
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub(crate) struct JsonPoint {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub(crate) struct JsonText {
    pub text: String,
    pub fontfamily: String,
    pub pixelsize: u32,
    pub wrap: bool,
    pub color: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub kerning: bool,
    pub halign: String,
    pub valign: String,
}

impl Default for JsonText {
    fn default() -> Self {
        JsonText {
            text: String::new(),
            fontfamily: "sans-serif".to_owned(),
            pixelsize: 16,
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

#[derive(Deserialize, Debug)]
pub(crate) struct JsonObject {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub polyline: Option<Vec<JsonPoint>>,
    #[serde(default)]
    pub polygon: Option<Vec<JsonPoint>>,
    #[serde(default)]
    pub ellipse: bool,
    #[serde(default)]
    pub text: Option<JsonText>,
    #[serde(default)]
    pub point: bool,
    #[serde(default)]
    pub properties: JsonProperties,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct JsonObjectGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<JsonObject>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonFrame {
    pub tileid: u32,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonTile {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub properties: JsonProperties,
    #[serde(default)]
    pub objectgroup: Option<JsonObjectGroup>,
    #[serde(default)]
    pub animation: Vec<JsonFrame>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Per-tile records: an array (newer exports) or an object keyed by local ID (legacy).
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum JsonTilesetTiles {
    List(Vec<JsonTile>),
    Legacy(HashMap<String, JsonTile>),
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonTileset {
    #[serde(default)]
    pub firstgid: u32,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub imagewidth: u32,
    #[serde(default)]
    pub imageheight: u32,
    #[serde(default)]
    pub tilewidth: u32,
    #[serde(default)]
    pub tileheight: u32,
    #[serde(default)]
    pub margin: u32,
    #[serde(default)]
    pub spacing: u32,
    #[serde(default)]
    pub tileoffset: Option<JsonPoint>,
    #[serde(default)]
    pub properties: JsonProperties,
    #[serde(default)]
    pub tiles: Option<JsonTilesetTiles>,
    /// Legacy per-tile properties keyed by local ID.
    #[serde(default)]
    pub tileproperties: HashMap<String, serde_json::Map<String, JsonValue>>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonMap {
    #[serde(default)]
    pub width: usize,
    #[serde(default)]
    pub height: usize,
    #[serde(default)]
    pub tilewidth: f32,
    #[serde(default)]
    pub tileheight: f32,
    #[serde(default)]
    pub orientation: String,
    #[serde(default)]
    pub renderorder: Option<String>,
    #[serde(default)]
    pub version: Option<JsonValue>,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default)]
    pub properties: JsonProperties,
    #[serde(default)]
    pub layers: Vec<JsonLayer>,
    #[serde(default)]
    pub tilesets: Vec<JsonTileset>,
    #[serde(default)]
    pub hexsidelength: f32,
    #[serde(default)]
    pub staggeraxis: Option<String>,
    #[serde(default)]
    pub staggerindex: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct JsonProperty {
    name: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    value: JsonValue,
}

/// Property list (`[{name,type,value}]`) or legacy `{name: value}` object.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub(crate) enum JsonProperties {
    List(Vec<JsonProperty>),
    Legacy(serde_json::Map<String, JsonValue>),
}

impl Default for JsonProperties {
    fn default() -> Self {
        JsonProperties::List(Vec::new())
    }
}

fn infer_property(value: &JsonValue) -> Option<PropertyValue> {
    if let Some(v) = value.as_bool() {
        Some(PropertyValue::Bool(v))
    } else if let Some(v) = value.as_i64() {
        Some(PropertyValue::I64(v))
    } else if let Some(v) = value.as_f64() {
        Some(PropertyValue::F32(v as f32))
    } else {
        value.as_str().map(|s| PropertyValue::String(s.to_owned()))
    }
}

fn json_property_to_value(prop: &JsonProperty) -> Option<PropertyValue> {
    let JsonProperty { name, kind, value } = prop;

    let parsed = match kind.as_deref() {
        Some("bool") => value.as_bool().map(PropertyValue::Bool),
        Some("int") | Some("object") => value.as_i64().map(PropertyValue::I64),
        Some("float") => value.as_f64().map(|n| PropertyValue::F32(n as f32)),
        Some("string") | Some("file") | Some("color") | Some("class") => {
            value.as_str().map(|s| PropertyValue::String(s.to_owned()))
        }
        Some(other) => {
            warn!("Skipping property '{name}' of unsupported type '{other}'");
            return None;
        }
        None => infer_property(value),
    };

    if parsed.is_none() {
        warn!("Skipping property '{name}': value does not fit its declared type");
    }
    parsed
}

pub(crate) fn legacy_properties(map: &serde_json::Map<String, JsonValue>) -> Properties {
    let mut out = Properties::new();
    for (name, value) in map {
        match infer_property(value) {
            Some(v) => {
                out.insert(name.clone(), v);
            }
            None => warn!("Skipping property '{name}': unsupported value"),
        }
    }
    out
}

pub(crate) fn properties_from_json(props: &JsonProperties) -> Properties {
    match props {
        JsonProperties::List(list) => list
            .iter()
            .filter_map(|p| json_property_to_value(p).map(|v| (p.name.clone(), v)))
            .collect(),
        JsonProperties::Legacy(map) => legacy_properties(map),
    }
}

pub(crate) fn version_string(version: &Option<JsonValue>) -> String {
    match version {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => "1".to_owned(),
    }
}

/// Parse a Tiled JSON document held in memory.
pub fn parse_json_tiled(json: &str, options: &ParseOptions) -> Result<MapData, MapError> {
    let j: JsonMap = serde_json::from_str(json)?;
    Ok(assemble(j, options))
}

/// Parse an already-decoded JSON value. The value is not modified.
pub fn parse_json_value(value: &JsonValue, options: &ParseOptions) -> Result<MapData, MapError> {
    let j = JsonMap::deserialize(value)?;
    Ok(assemble(j, options))
}

/// Read and parse a `.json` map file.
pub fn decode_map_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<MapData, MapError> {
    let p = path.as_ref();
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::UnsupportedFormat(p.display().to_string()));
    }

    let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })?;
    let j: JsonMap = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: p.to_path_buf(),
        source,
    })?;

    Ok(assemble(j, options))
}
