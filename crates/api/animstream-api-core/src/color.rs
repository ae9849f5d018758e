//! Packed 32-bit RGBA colors (0xRRGGBBAA) as carried in LED messages.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgba(pub u32);

impl Rgba {
    pub const OFF: Rgba = Rgba(0);
    pub const WHITE: Rgba = Rgba(0xFFFF_FFFF);
    pub const RED: Rgba = Rgba(0xFF00_00FF);
    pub const GREEN: Rgba = Rgba(0x00FF_00FF);
    pub const BLUE: Rgba = Rgba(0x0000_FFFF);

    pub const fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// Pack normalized `[r, g, b, a]` floats; components are clamped to [0,1].
    pub fn from_unit([r, g, b, a]: [f32; 4]) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::from_bytes(q(r), q(g), q(b), q(a))
    }

    #[inline]
    pub fn r(self) -> u8 {
        (self.0 >> 24) as u8
    }
    #[inline]
    pub fn g(self) -> u8 {
        (self.0 >> 16) as u8
    }
    #[inline]
    pub fn b(self) -> u8 {
        (self.0 >> 8) as u8
    }
    #[inline]
    pub fn a(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}
