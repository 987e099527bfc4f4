use crate::grid::transform::LayerTransform;
use crate::properties::Properties;
use macroquad::prelude::{Color, Rect, WHITE};
use std::fmt;
use std::rc::Rc;

/// Callback the physics collaborator runs when a body touches a tile.
///
/// Returning `true` asks the caller to go ahead with separation. Any context
/// the callback needs is captured by the closure.
#[derive(Clone)]
pub struct CollisionCallback(Rc<dyn Fn(&Tile) -> bool>);

impl CollisionCallback {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&Tile) -> bool + 'static) -> Self {
        CollisionCallback(Rc::new(f))
    }

    /// Invoke the callback with `tile`.
    pub fn call(&self, tile: &Tile) -> bool {
        (self.0)(tile)
    }

    /// Whether both handles share the same closure.
    pub fn ptr_eq(&self, other: &CollisionCallback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CollisionCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CollisionCallback(..)")
    }
}

/// One grid cell of a tile layer.
///
/// `index` is the global tile ID with flip bits stripped, or `-1` for an
/// empty cell. `x`/`y` are tile coordinates inside the owning layer.
#[derive(Debug, Clone)]
pub struct Tile {
    /// GID with flip bits stripped; `-1` for an empty cell.
    pub index: i32,
    /// Column in the layer grid.
    pub x: i32,
    /// Row in the layer grid.
    pub y: i32,
    /// Rendered size; may differ from the layer grid when the tileset uses bigger tiles.
    pub width: f32,
    /// Rendered height.
    pub height: f32,
    /// Grid cell size of the owning layer.
    pub base_width: f32,
    /// Grid cell height of the owning layer.
    pub base_height: f32,
    /// Left edge in layer pixels.
    pub pixel_x: f32,
    /// Top edge in layer pixels, bottom-aligned for tall tiles.
    pub pixel_y: f32,
    /// `pixel_x + width`.
    pub right: f32,
    /// `pixel_y + height`.
    pub bottom: f32,
    /// Per-tile properties, merged from the tileset on load.
    pub properties: Properties,
    /// Radians, from the GID flip bits.
    pub rotation: f32,
    /// Mirrored horizontally after rotation.
    pub flip_x: bool,
    /// Mirrored vertically.
    pub flip_y: bool,
    /// Opacity, 0 to 1.
    pub alpha: f32,
    /// Drawn by the host when set.
    pub visible: bool,
    /// Collides on its left side.
    pub collide_left: bool,
    /// Collides on its right side.
    pub collide_right: bool,
    /// Collides on its top side.
    pub collide_up: bool,
    /// Collides on its bottom side.
    pub collide_down: bool,
    /// Interesting faces: solid sides with no solid neighbour.
    pub face_left: bool,
    /// See `face_left`.
    pub face_right: bool,
    /// See `face_left`.
    pub face_top: bool,
    /// See `face_left`.
    pub face_bottom: bool,
    /// Per-tile callback; wins over the layer's index callbacks.
    pub collision_callback: Option<CollisionCallback>,
    /// Draw tint.
    pub tint: Color,
    /// Fill with the tint instead of multiplying.
    pub tint_fill: bool,
    /// Scratch space owned by the physics collaborator.
    pub physics: Properties,
}

impl Tile {
    /// Tile whose base size equals its size.
    pub fn new(index: i32, x: i32, y: i32, width: f32, height: f32) -> Self {
        Self::with_base(index, x, y, width, height, width, height)
    }

    /// Tile whose grid cell (`base_*`) differs from its drawn size.
    pub fn with_base(
        index: i32,
        x: i32,
        y: i32,
        width: f32,
        height: f32,
        base_width: f32,
        base_height: f32,
    ) -> Self {
        let mut tile = Tile {
            index,
            x,
            y,
            width,
            height,
            base_width,
            base_height,
            pixel_x: 0.0,
            pixel_y: 0.0,
            right: 0.0,
            bottom: 0.0,
            properties: Properties::new(),
            rotation: 0.0,
            flip_x: false,
            flip_y: false,
            alpha: 1.0,
            visible: true,
            collide_left: false,
            collide_right: false,
            collide_up: false,
            collide_down: false,
            face_left: false,
            face_right: false,
            face_top: false,
            face_bottom: false,
            collision_callback: None,
            tint: WHITE,
            tint_fill: false,
            physics: Properties::new(),
        };
        tile.update_pixel_xy();
        tile
    }

    /// An index `-1` placeholder.
    pub fn empty(x: i32, y: i32, width: f32, height: f32) -> Self {
        Self::new(-1, x, y, width, height)
    }

    /// Index `-1`.
    pub fn is_empty(&self) -> bool {
        self.index < 0
    }

    /// Any collide side set, or a callback attached.
    pub fn can_collide(&self) -> bool {
        self.collides() || self.collision_callback.is_some()
    }

    /// Any collide side set; a callback alone does not count.
    pub fn collides(&self) -> bool {
        self.collide_left || self.collide_right || self.collide_up || self.collide_down
    }

    /// Any face flag set.
    pub fn has_interesting_face(&self) -> bool {
        self.face_top || self.face_bottom || self.face_left || self.face_right
    }

    /// Filter used by queries: colliding and/or with interesting faces.
    pub fn is_interesting(&self, collides: bool, faces: bool) -> bool {
        match (collides, faces) {
            (true, true) => self.can_collide() || self.has_interesting_face(),
            (true, false) => self.collides(),
            (false, true) => self.has_interesting_face(),
            (false, false) => false,
        }
    }

    /// Clear collide sides and faces. Neighbour faces are the layer's job.
    pub fn reset_collision(&mut self) -> &mut Self {
        self.collide_left = false;
        self.collide_right = false;
        self.collide_up = false;
        self.collide_down = false;
        self.reset_faces()
    }

    /// Clear all four face flags.
    pub fn reset_faces(&mut self) -> &mut Self {
        self.face_top = false;
        self.face_bottom = false;
        self.face_left = false;
        self.face_right = false;
        self
    }

    /// Set each collide side; faces start out matching the sides.
    pub fn set_collision(&mut self, left: bool, right: bool, up: bool, down: bool) -> &mut Self {
        self.collide_left = left;
        self.collide_right = right;
        self.collide_up = up;
        self.collide_down = down;
        self.face_left = left;
        self.face_right = right;
        self.face_top = up;
        self.face_bottom = down;
        self
    }

    /// All four sides on or off.
    pub fn set_collision_all(&mut self, collides: bool) -> &mut Self {
        self.set_collision(collides, collides, collides, collides)
    }

    /// Attach or clear the per-tile callback.
    pub fn set_collision_callback(&mut self, callback: Option<CollisionCallback>) -> &mut Self {
        self.collision_callback = callback;
        self
    }

    /// Run the attached callback, if any.
    pub fn run_collision_callback(&self) -> Option<bool> {
        self.collision_callback.as_ref().map(|cb| cb.call(self))
    }

    /// Change drawn and/or base size, then refresh pixel bounds.
    pub fn set_size(
        &mut self,
        width: Option<f32>,
        height: Option<f32>,
        base_width: Option<f32>,
        base_height: Option<f32>,
    ) -> &mut Self {
        if let Some(w) = width {
            self.width = w;
        }
        if let Some(h) = height {
            self.height = h;
        }
        if let Some(w) = base_width {
            self.base_width = w;
        }
        if let Some(h) = base_height {
            self.base_height = h;
        }
        self.update_pixel_xy()
    }

    /// Recompute pixel bounds from grid position and size.
    pub fn update_pixel_xy(&mut self) -> &mut Self {
        self.pixel_x = self.x as f32 * self.base_width;
        self.pixel_y = self.y as f32 * self.base_height;
        self.right = self.pixel_x + self.base_width;
        self.bottom = self.pixel_y + self.base_height;
        self
    }

    /// Overlap test in layer pixel space; touching edges do not count.
    pub fn intersects(&self, x: f32, y: f32, right: f32, bottom: f32) -> bool {
        !(right <= self.pixel_x || bottom <= self.pixel_y || x >= self.right || y >= self.bottom)
    }

    /// World x of the left edge.
    pub fn left(&self, transform: Option<&LayerTransform>) -> f32 {
        match transform {
            Some(t) => t.tile_to_world_x(self.x),
            None => self.x as f32 * self.base_width,
        }
    }

    /// World x of the right edge.
    pub fn right_edge(&self, transform: Option<&LayerTransform>) -> f32 {
        match transform {
            Some(t) => self.left(transform) + self.width * t.scale.x,
            None => self.left(None) + self.width,
        }
    }

    /// Taller-than-grid tiles grow upwards from the cell's bottom edge.
    pub fn top(&self, transform: Option<&LayerTransform>) -> f32 {
        match transform {
            Some(t) => t.tile_to_world_y(self.y),
            None => self.y as f32 * self.base_height - (self.height - self.base_height),
        }
    }

    /// World y of the bottom edge.
    pub fn bottom_edge(&self, transform: Option<&LayerTransform>) -> f32 {
        match transform {
            Some(t) => self.top(transform) + self.height * t.scale.y,
            None => self.top(None) + self.height,
        }
    }

    /// World rectangle.
    pub fn bounds(&self, transform: Option<&LayerTransform>) -> Rect {
        let x = self.left(transform);
        let y = self.top(transform);
        Rect::new(x, y, self.right_edge(transform) - x, self.bottom_edge(transform) - y)
    }

    /// World x of the centre.
    pub fn center_x(&self, transform: Option<&LayerTransform>) -> f32 {
        (self.left(transform) + self.right_edge(transform)) / 2.0
    }

    /// World y of the centre.
    pub fn center_y(&self, transform: Option<&LayerTransform>) -> f32 {
        (self.top(transform) + self.bottom_edge(transform)) / 2.0
    }

    /// Copy the visual and collision state of `other`, keeping this tile's position.
    pub fn copy_from(&mut self, other: &Tile) -> &mut Self {
        self.index = other.index;
        self.alpha = other.alpha;
        self.properties = other.properties.clone();
        self.visible = other.visible;
        self.flip_x = other.flip_x;
        self.flip_y = other.flip_y;
        self.tint = other.tint;
        self.tint_fill = other.tint_fill;
        self.rotation = other.rotation;
        self.collide_up = other.collide_up;
        self.collide_down = other.collide_down;
        self.collide_left = other.collide_left;
        self.collide_right = other.collide_right;
        self.collision_callback = other.collision_callback.clone();
        self
    }

    /// Drop callback and property data when the owning layer is discarded.
    pub fn destroy(&mut self) {
        self.collision_callback = None;
        self.properties = Properties::new();
        self.physics = Properties::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::prelude::vec2;

    #[test]
    fn callback_alone_can_collide_but_does_not_collide() {
        let mut tile = Tile::new(3, 0, 0, 16.0, 16.0);
        assert!(!tile.can_collide());

        tile.set_collision_callback(Some(CollisionCallback::new(|_| true)));
        assert!(tile.can_collide());
        assert!(!tile.collides());
        assert_eq!(tile.run_collision_callback(), Some(true));

        tile.set_collision(false, false, true, false);
        assert!(tile.collides());
        assert!(tile.face_top);
        assert!(!tile.face_left);
    }

    #[test]
    fn pixel_position_follows_base_size() {
        let mut tile = Tile::with_base(1, 2, 3, 32.0, 48.0, 16.0, 16.0);
        assert_eq!((tile.pixel_x, tile.pixel_y), (32.0, 48.0));
        assert_eq!((tile.right, tile.bottom), (48.0, 64.0));

        // unattached bounds grow upwards for tall tiles
        assert_eq!(tile.top(None), 48.0 - 32.0);

        tile.set_size(None, None, Some(8.0), Some(8.0));
        assert_eq!((tile.pixel_x, tile.pixel_y), (16.0, 24.0));
    }

    #[test]
    fn bounds_use_layer_transform_when_given() {
        let tile = Tile::new(1, 2, 1, 16.0, 16.0);
        let t = LayerTransform::new(vec2(100.0, 50.0), vec2(2.0, 2.0), vec2(16.0, 16.0));
        let r = tile.bounds(Some(&t));
        assert_eq!((r.x, r.y, r.w, r.h), (164.0, 82.0, 32.0, 32.0));
        assert_eq!(tile.center_x(Some(&t)), 180.0);
    }

    #[test]
    fn intersects_excludes_touching_edges() {
        let tile = Tile::new(1, 1, 1, 10.0, 10.0);
        assert!(tile.intersects(5.0, 5.0, 11.0, 11.0));
        assert!(!tile.intersects(0.0, 0.0, 10.0, 10.0));
        assert!(!tile.intersects(20.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn is_interesting_combinations() {
        let mut tile = Tile::new(1, 0, 0, 8.0, 8.0);
        tile.face_left = true;
        assert!(tile.is_interesting(false, true));
        assert!(!tile.is_interesting(true, false));
        assert!(tile.is_interesting(true, true));
        assert!(!tile.is_interesting(false, false));
    }

    #[test]
    fn destroy_clears_callback_and_properties() {
        let mut tile = Tile::new(1, 0, 0, 8.0, 8.0);
        tile.properties.insert("k", 1);
        tile.set_collision_callback(Some(CollisionCallback::new(|_| false)));
        tile.destroy();
        assert!(tile.properties.is_empty());
        assert!(tile.collision_callback.is_none());
    }
}
