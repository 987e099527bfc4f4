//! Flattens nested `group` layers into per-kind leaf sequences.

use crate::loader::json_loader::JsonLayer;
use log::warn;

/// Leaf layer kinds the parsers ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayerKind {
    Tile,
    Object,
    Image,
}

impl LayerKind {
    fn type_name(self) -> &'static str {
        match self {
            LayerKind::Tile => "tilelayer",
            LayerKind::Object => "objectgroup",
            LayerKind::Image => "imagelayer",
        }
    }
}

/// What a leaf inherits from its enclosing groups.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GroupState {
    /// `"outer/inner/"`, empty at the root.
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub visible: bool,
}

impl GroupState {
    pub fn root() -> Self {
        GroupState {
            name: String::new(),
            x: 0.0,
            y: 0.0,
            opacity: 1.0,
            visible: true,
        }
    }

    fn child(&self, group: &JsonLayer, tile_width: f32, tile_height: f32) -> Self {
        GroupState {
            name: format!("{}{}/", self.name, group.name),
            x: self.x + group.x + group.startx as f32 * tile_width + group.offsetx,
            y: self.y + group.y + group.starty as f32 * tile_height + group.offsety,
            opacity: self.opacity * group.opacity,
            visible: self.visible && group.visible,
        }
    }
}

struct Frame<'a> {
    layers: &'a [JsonLayer],
    i: usize,
    state: GroupState,
}

/// Depth-first walk over `layers`, returning leaves of `kind` in editor
/// order with their inherited group state.
pub(crate) fn flatten_layers(
    layers: &[JsonLayer],
    kind: LayerKind,
    tile_width: f32,
    tile_height: f32,
) -> Vec<(&JsonLayer, GroupState)> {
    let mut out = Vec::new();
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut cur = Frame {
        layers,
        i: 0,
        state: GroupState::root(),
    };

    while cur.i < cur.layers.len() || !stack.is_empty() {
        if cur.i >= cur.layers.len() {
            let Some(parent) = stack.pop() else {
                warn!("Invalid layer group hierarchy");
                break;
            };
            cur = parent;
            continue;
        }

        let siblings = cur.layers;
        let layer = &siblings[cur.i];
        cur.i += 1;

        if layer.kind() == "group" {
            let state = cur.state.child(layer, tile_width, tile_height);
            let parent = std::mem::replace(
                &mut cur,
                Frame {
                    layers: &layer.layers,
                    i: 0,
                    state,
                },
            );
            stack.push(parent);
        } else if layer.kind() == kind.type_name() {
            out.push((layer, cur.state.clone()));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(json: &str) -> Vec<JsonLayer> {
        serde_json::from_str(json).expect("layers")
    }

    #[test]
    fn nested_groups_accumulate_state() {
        let tree = layers(
            r#"[
              {"type":"group","name":"outer","offsetx":10,"offsety":20,"opacity":0.5,"layers":[
                {"type":"tilelayer","name":"a"},
                {"type":"group","name":"inner","x":1,"startx":2,"visible":false,"opacity":0.5,"layers":[
                  {"type":"tilelayer","name":"b"},
                  {"type":"objectgroup","name":"o"}
                ]},
                {"type":"tilelayer","name":"c"}
              ]},
              {"name":"d"}
            ]"#,
        );

        let tiles = flatten_layers(&tree, LayerKind::Tile, 16.0, 16.0);
        let names: Vec<String> = tiles
            .iter()
            .map(|(l, g)| format!("{}{}", g.name, l.name))
            .collect();
        assert_eq!(names, vec!["outer/a", "outer/inner/b", "outer/c", "d"]);

        let (_, inner) = &tiles[1];
        assert_eq!((inner.x, inner.y), (10.0 + 1.0 + 32.0, 20.0));
        assert_eq!(inner.opacity, 0.25);
        assert!(!inner.visible);

        let (_, outer) = &tiles[2];
        assert_eq!((outer.x, outer.y), (10.0, 20.0));
        assert!(outer.visible);

        assert_eq!(tiles[3].1, GroupState::root());

        let objects = flatten_layers(&tree, LayerKind::Object, 16.0, 16.0);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].1.name, "outer/inner/");
    }

    #[test]
    fn empty_groups_and_deep_nesting() {
        let mut json = String::from(r#"{"type":"tilelayer","name":"leaf"}"#);
        for _ in 0..30 {
            json = format!(r#"{{"type":"group","name":"g","layers":[{json}, {{"type":"group","name":"e"}}]}}"#);
        }
        let tree = layers(&format!("[{json}]"));
        let tiles = flatten_layers(&tree, LayerKind::Tile, 8.0, 8.0);
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].1.name, "g/".repeat(30));
        assert!(flatten_layers(&tree, LayerKind::Image, 8.0, 8.0).is_empty());
    }
}
