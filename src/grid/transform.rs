//! Tile <-> world coordinate conversion for one layer.

use crate::layer::LayerData;
use macroquad::prelude::{vec2, Vec2};

/// Placement of a layer's grid in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerTransform {
    pub origin: Vec2,
    pub scale: Vec2,
    /// Base (grid) tile size of the layer.
    pub tile_size: Vec2,
}

impl LayerTransform {
    pub fn new(origin: Vec2, scale: Vec2, tile_size: Vec2) -> Self {
        LayerTransform {
            origin,
            scale,
            tile_size,
        }
    }

    /// Transform of a layer with no runtime attachment: origin at zero, unit scale.
    pub fn unattached(layer: &LayerData) -> Self {
        Self::new(
            Vec2::ZERO,
            Vec2::ONE,
            vec2(layer.base_tile_width, layer.base_tile_height),
        )
    }

    #[inline]
    fn cell_w(&self) -> f32 {
        self.tile_size.x * self.scale.x
    }

    #[inline]
    fn cell_h(&self) -> f32 {
        self.tile_size.y * self.scale.y
    }

    pub fn tile_to_world_x(&self, tile_x: i32) -> f32 {
        self.origin.x + tile_x as f32 * self.cell_w()
    }

    pub fn tile_to_world_y(&self, tile_y: i32) -> f32 {
        self.origin.y + tile_y as f32 * self.cell_h()
    }

    pub fn tile_to_world_xy(&self, tile_x: i32, tile_y: i32) -> Vec2 {
        vec2(self.tile_to_world_x(tile_x), self.tile_to_world_y(tile_y))
    }

    /// Fractional tile coordinate, floored when `snap_to_floor` is set.
    pub fn world_to_tile_x(&self, world_x: f32, snap_to_floor: bool) -> f32 {
        let t = (world_x - self.origin.x) / self.cell_w();
        if snap_to_floor {
            t.floor()
        } else {
            t
        }
    }

    pub fn world_to_tile_y(&self, world_y: f32, snap_to_floor: bool) -> f32 {
        let t = (world_y - self.origin.y) / self.cell_h();
        if snap_to_floor {
            t.floor()
        } else {
            t
        }
    }

    pub fn world_to_tile_xy(&self, world_x: f32, world_y: f32, snap_to_floor: bool) -> Vec2 {
        vec2(
            self.world_to_tile_x(world_x, snap_to_floor),
            self.world_to_tile_y(world_y, snap_to_floor),
        )
    }

    /// Integer tile containing the world point.
    pub fn world_to_tile_cell(&self, world_x: f32, world_y: f32) -> (i32, i32) {
        let p = self.world_to_tile_xy(world_x, world_y, true);
        (p.x as i32, p.y as i32)
    }
}
