use crate::grid::transform::LayerTransform;
use crate::layer::LayerData;
use crate::tileset::Tileset;
use macroquad::prelude::{vec2, Vec2};

/// Handle to a runtime layer owned by a [`crate::Tilemap`].
///
/// Slots freed by detaching are reused; the generation keeps a stale handle
/// from resolving to the layer that took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilemapLayerId {
    slot: u32,
    generation: u32,
}

impl TilemapLayerId {
    pub(crate) fn new(slot: u32, generation: u32) -> Self {
        TilemapLayerId { slot, generation }
    }

    pub(crate) fn slot(self) -> usize {
        self.slot as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

/// A layer that is live in the simulation: placement, scale and the
/// tilesets it draws from.
#[derive(Debug, Clone)]
pub struct TilemapLayer {
    pub id: TilemapLayerId,
    /// Index into the owning tilemap's layers.
    pub layer_index: usize,
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// Indices into the tilemap's tilesets, in registration order.
    pub tilesets: Vec<usize>,
    /// `(first_gid, end_gid, tileset index)` in registration order.
    gid_ranges: Vec<(u32, u64, usize)>,
    pub tiles_total: usize,
}

impl TilemapLayer {
    pub(crate) fn new(id: TilemapLayerId, layer_index: usize, layer: &LayerData, x: f32, y: f32) -> Self {
        TilemapLayer {
            id,
            layer_index,
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            tilesets: Vec::new(),
            gid_ranges: Vec::new(),
            tiles_total: layer.width * layer.height,
        }
    }

    pub fn set_position(&mut self, x: f32, y: f32) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn set_scale(&mut self, x: f32, y: f32) -> &mut Self {
        self.scale_x = x;
        self.scale_y = y;
        self
    }

    pub fn position(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    /// Register tilesets by index into `all`, rebuilding the GID ranges.
    ///
    /// Each tileset claims `total` consecutive GIDs from its `first_gid`.
    /// Overlapping ranges are resolved by registration order: the tileset
    /// registered last wins. Indices that do not exist in `all` are skipped.
    pub fn set_tilesets(&mut self, all: &[Tileset], indices: &[usize]) -> &mut Self {
        let mut gid_ranges = Vec::with_capacity(indices.len());
        let mut set_list = Vec::with_capacity(indices.len());

        for &i in indices {
            let Some(ts) = all.get(i) else { continue };
            set_list.push(i);
            gid_ranges.push((ts.first_gid, ts.first_gid as u64 + ts.total as u64, i));
        }

        self.gid_ranges = gid_ranges;
        self.tilesets = set_list;
        self
    }

    /// Tileset index registered for `gid` on this layer.
    pub fn tileset_index_for(&self, gid: i32) -> Option<usize> {
        let gid = u64::try_from(gid).ok()?;
        self.gid_ranges
            .iter()
            .rev()
            .find(|&&(first, end, _)| gid >= first as u64 && gid < end)
            .map(|&(_, _, i)| i)
    }

    pub fn transform(&self, layer: &LayerData) -> LayerTransform {
        LayerTransform::new(
            vec2(self.x, self.y),
            vec2(self.scale_x, self.scale_y),
            vec2(layer.base_tile_width, layer.base_tile_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(name: &str, first_gid: u32, total_cols: u32) -> Tileset {
        let mut ts = Tileset::new(name, first_gid, 8, 8, 0, 0);
        ts.update_tile_data(total_cols * 8, 8);
        ts
    }

    #[test]
    fn gid_ranges_cover_each_tileset() {
        let sets = vec![sized("a", 1, 4), sized("b", 5, 2)];
        let layer = LayerData::new("l", 1, 1, 8.0, 8.0);
        let mut tl = TilemapLayer::new(TilemapLayerId::new(0, 0), 0, &layer, 0.0, 0.0);
        tl.set_tilesets(&sets, &[0, 1, 7]);

        assert_eq!(tl.tilesets, vec![0, 1]);
        assert_eq!(tl.tileset_index_for(0), None);
        assert_eq!(tl.tileset_index_for(4), Some(0));
        assert_eq!(tl.tileset_index_for(5), Some(1));
        assert_eq!(tl.tileset_index_for(7), None);
        assert_eq!(tl.tileset_index_for(-1), None);
    }

    #[test]
    fn overlapping_ranges_resolve_by_registration_order() {
        // the last registered tileset takes the shared GIDs
        let sets = vec![sized("a", 1, 4), sized("b", 3, 4)];
        let layer = LayerData::new("l", 1, 1, 8.0, 8.0);
        let mut tl = TilemapLayer::new(TilemapLayerId::new(0, 0), 0, &layer, 0.0, 0.0);

        tl.set_tilesets(&sets, &[0, 1]);
        assert_eq!(tl.tileset_index_for(3), Some(1));
        assert_eq!(tl.tileset_index_for(2), Some(0));

        tl.set_tilesets(&sets, &[1, 0]);
        assert_eq!(tl.tileset_index_for(3), Some(0));
        assert_eq!(tl.tileset_index_for(6), Some(1));
    }

    #[test]
    fn far_gid_ranges_resolve() {
        let sets = vec![sized("far", 20_000_000, 1), sized("edge", crate::gid::GID_MASK, 1)];
        let layer = LayerData::new("l", 1, 1, 8.0, 8.0);
        let mut tl = TilemapLayer::new(TilemapLayerId::new(0, 0), 0, &layer, 0.0, 0.0);
        tl.set_tilesets(&sets, &[0, 1]);

        assert_eq!(tl.tileset_index_for(20_000_000), Some(0));
        assert_eq!(tl.tileset_index_for(20_000_001), None);
        assert_eq!(tl.tileset_index_for(crate::gid::GID_MASK as i32), Some(1));
        assert_eq!(tl.tileset_index_for(i32::MAX), None);
    }
}
