#![warn(missing_docs)]

//! Tiled JSON map loader and runtime tile grid.
//!
//! Parses editor exports (nested groups, flipped GIDs, infinite chunked
//! layers, embedded tilesets and image collections) into [`MapData`], and
//! wraps it in a [`Tilemap`] for coordinate conversion, tile queries,
//! collision setup and interesting-face precomputation.

mod error;
mod gid;
#[allow(missing_docs)]
mod layer;
mod loader {
    pub(crate) mod assemble;
    pub(crate) mod groups;
    pub mod json_loader;
    pub(crate) mod objects;
    pub mod tile_layers;
    pub(crate) mod tilesets;
}
#[allow(missing_docs)]
mod map;
#[allow(missing_docs)]
mod map_data;
#[allow(missing_docs)]
mod object;
#[allow(missing_docs)]
mod properties;
mod tile;
#[allow(missing_docs)]
mod tilemap_layer;
mod tileset;

/// Layer-level operations used by [`Tilemap`]; callable directly on a [`LayerData`].
pub mod grid {
    #[allow(missing_docs)]
    pub mod collision;
    #[allow(missing_docs)]
    pub mod edit;
    pub mod faces;
    #[allow(missing_docs)]
    pub mod query;
    #[allow(missing_docs)]
    pub mod transform;
}

pub use error::MapError;
pub use gid::{parse_gid, GidData, TileId, FLIP_D, FLIP_H, FLIP_MASK, FLIP_V, GID_MASK};
pub use grid::edit::TileSource;
pub use grid::query::FilteringOptions;
pub use grid::transform::LayerTransform;
pub use layer::{Cell, LayerData};
pub use loader::json_loader::{decode_map_file, parse_json_tiled, parse_json_value, ParseOptions};
pub use loader::tile_layers::decode_base64_gids;
pub use map::{ImageRegistry, LayerRef, Tilemap, TilesetImageOptions};
pub use map_data::{ImageLayer, MapData, MapFormat, Orientation, RenderOrder, TileIndex, TileIndexEntry};
pub use object::{MapObject, ObjectLayer, ObjectShape, TextData};
pub use properties::{Properties, PropertyValue};
pub use tile::{CollisionCallback, Tile};
pub use tilemap_layer::{TilemapLayer, TilemapLayerId};
pub use tileset::{AnimationFrame, CollectionImage, ImageCollection, ObjectGroup, TileData, Tileset};
