//! Global tile ID codec: the top three bits of a Tiled GID carry flip flags.

use std::f32::consts::{FRAC_PI_2, PI};

/// Horizontal flip, bit 31.
pub const FLIP_H: u32 = 0x8000_0000;
/// Vertical flip, bit 30.
pub const FLIP_V: u32 = 0x4000_0000;
/// Anti-diagonal flip, bit 29.
pub const FLIP_D: u32 = 0x2000_0000;
/// All three flip bits.
pub const FLIP_MASK: u32 = FLIP_H | FLIP_V | FLIP_D;
/// Bits left for the tile ID itself.
pub const GID_MASK: u32 = !FLIP_MASK;

/// A raw 32-bit tile reference as stored in the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

impl TileId {
    /// Pack a clean ID and flip flags back into a raw reference.
    pub fn from_parts(gid: u32, flip_h: bool, flip_v: bool, flip_d: bool) -> Self {
        let mut raw = gid & GID_MASK;
        if flip_h {
            raw |= FLIP_H;
        }
        if flip_v {
            raw |= FLIP_V;
        }
        if flip_d {
            raw |= FLIP_D;
        }
        TileId(raw)
    }

    /// The reference as stored.
    /// ID with flip bits cleared.
    /// Horizontal flip bit.
    /// Vertical flip bit.
    /// Anti-diagonal flip bit.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }

    /// Same as [`parse_gid`].
    pub fn decode(self) -> GidData {
        parse_gid(self.0)
    }
}

/// Decoded form of a [`TileId`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GidData {
    /// ID with the flag bits stripped; 0 means empty.
    pub gid: u32,
    /// Bit 31 as stored.
    pub flipped_horizontal: bool,
    /// Bit 30 as stored.
    pub flipped_vertical: bool,
    /// Bit 29 as stored.
    pub flipped_anti_diagonal: bool,
    /// Clockwise rotation in radians: 0, π/2, π or 3π/2.
    pub rotation: f32,
    /// Residual horizontal mirror after the rotation is applied.
    pub flipped: bool,
}

impl GidData {
    /// Re-encode into the raw 32-bit reference.
    pub fn to_tile_id(&self) -> TileId {
        TileId::from_parts(
            self.gid,
            self.flipped_horizontal,
            self.flipped_vertical,
            self.flipped_anti_diagonal,
        )
    }
}

/// Decode a raw GID into its clean ID plus rotation/mirror form.
pub fn parse_gid(raw: u32) -> GidData {
    let h = raw & FLIP_H != 0;
    let v = raw & FLIP_V != 0;
    let d = raw & FLIP_D != 0;

    let (rotation, flipped) = match (h, v, d) {
        (false, false, false) => (0.0, false),
        (true, false, false) => (0.0, true),
        (false, true, false) => (PI, true),
        (true, true, false) => (PI, false),
        (false, false, true) => (3.0 * FRAC_PI_2, true),
        (true, false, true) => (FRAC_PI_2, false),
        (false, true, true) => (3.0 * FRAC_PI_2, false),
        (true, true, true) => (FRAC_PI_2, true),
    };

    GidData {
        gid: raw & GID_MASK,
        flipped_horizontal: h,
        flipped_vertical: v,
        flipped_anti_diagonal: d,
        rotation,
        flipped,
    }
}
