//! LED states for cubes (four LEDs) and the backpack (five LEDs).

use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::numeric::clamp_narrow;

pub const CUBE_LED_COUNT: usize = 4;
pub const BACKPACK_LED_COUNT: usize = 5;

/// How a cube's LED ring is oriented relative to the robot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MakeRelativeMode {
    #[default]
    Off,
    ClosestToPoint,
    FarthestFromPoint,
}

/// Complete LED state for one cube.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectLights {
    pub on_colors: [Rgba; CUBE_LED_COUNT],
    pub off_colors: [Rgba; CUBE_LED_COUNT],
    pub on_period_ms: [u32; CUBE_LED_COUNT],
    pub off_period_ms: [u32; CUBE_LED_COUNT],
    pub transition_on_period_ms: [u32; CUBE_LED_COUNT],
    pub transition_off_period_ms: [u32; CUBE_LED_COUNT],
    pub offset_ms: [i32; CUBE_LED_COUNT],
    pub rotation_period_ms: u32,
    pub make_relative: MakeRelativeMode,
    pub relative_point: [f32; 2],
}

impl ObjectLights {
    /// All LEDs dark.
    pub fn off() -> Self {
        Self::default()
    }

    /// Solid color on every LED (on and off phases share the color).
    pub fn solid(color: Rgba) -> Self {
        Self {
            on_colors: [color; CUBE_LED_COUNT],
            off_colors: [color; CUBE_LED_COUNT],
            on_period_ms: [u32::MAX; CUBE_LED_COUNT],
            ..Self::default()
        }
    }

    /// Convert to the on-wire frame representation.
    pub fn to_wire(&self, led_frame_ms: u32, green_blue_scale: f32) -> CubeLightsFrame {
        let frames = |ms: &[u32; CUBE_LED_COUNT]| {
            let mut out = [0u8; CUBE_LED_COUNT];
            for (o, v) in out.iter_mut().zip(ms.iter()) {
                *o = ms_to_led_frames(*v, led_frame_ms);
            }
            out
        };
        let mut offset = [0i8; CUBE_LED_COUNT];
        for (o, v) in offset.iter_mut().zip(self.offset_ms.iter()) {
            let f = signed_ms_to_led_frames(*v, led_frame_ms);
            *o = clamp_narrow(f, "CubeLights.offset");
        }
        CubeLightsFrame {
            on_colors: self.on_colors.map(|c| white_balance(c, green_blue_scale)),
            off_colors: self.off_colors.map(|c| white_balance(c, green_blue_scale)),
            on_frames: frames(&self.on_period_ms),
            off_frames: frames(&self.off_period_ms),
            transition_on_frames: frames(&self.transition_on_period_ms),
            transition_off_frames: frames(&self.transition_off_period_ms),
            offset_frames: offset,
            rotation_period_frames: ms_to_led_frames(self.rotation_period_ms, led_frame_ms),
        }
    }
}

/// Cube light state as it goes over the wire: periods in LED frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeLightsFrame {
    pub on_colors: [Rgba; CUBE_LED_COUNT],
    pub off_colors: [Rgba; CUBE_LED_COUNT],
    pub on_frames: [u8; CUBE_LED_COUNT],
    pub off_frames: [u8; CUBE_LED_COUNT],
    pub transition_on_frames: [u8; CUBE_LED_COUNT],
    pub transition_off_frames: [u8; CUBE_LED_COUNT],
    pub offset_frames: [i8; CUBE_LED_COUNT],
    pub rotation_period_frames: u8,
}

/// Milliseconds to LED frames, rounding up and saturating at `u8::MAX`.
pub fn ms_to_led_frames(ms: u32, led_frame_ms: u32) -> u8 {
    if ms == u32::MAX {
        return u8::MAX;
    }
    let frame = led_frame_ms.max(1) as u64;
    let frames = (ms as u64 + frame - 1) / frame;
    clamp_narrow(frames as i64, "CubeLights.period")
}

fn signed_ms_to_led_frames(ms: i32, led_frame_ms: u32) -> i64 {
    let frame = led_frame_ms.max(1) as i64;
    let ms = ms as i64;
    if ms >= 0 {
        (ms + frame - 1) / frame
    } else {
        -((-ms + frame - 1) / frame)
    }
}

/// Cube LEDs render red weakly; when red is present green and blue are scaled down.
pub fn white_balance(c: Rgba, green_blue_scale: f32) -> Rgba {
    if c.r() == 0 {
        return c;
    }
    let scale = |v: u8| (v as f32 * green_blue_scale).round().clamp(0.0, 255.0) as u8;
    Rgba::from_bytes(c.r(), scale(c.g()), scale(c.b()), c.a())
}

/// Complete LED state for the robot's backpack.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackpackLights {
    pub on_colors: [Rgba; BACKPACK_LED_COUNT],
    pub off_colors: [Rgba; BACKPACK_LED_COUNT],
    pub on_period_ms: [u32; BACKPACK_LED_COUNT],
    pub off_period_ms: [u32; BACKPACK_LED_COUNT],
    pub transition_on_period_ms: [u32; BACKPACK_LED_COUNT],
    pub transition_off_period_ms: [u32; BACKPACK_LED_COUNT],
    pub offset_ms: [i32; BACKPACK_LED_COUNT],
}

impl BackpackLights {
    pub fn off() -> Self {
        Self::default()
    }

    /// Static per-LED colors, as streamed by animation keyframes.
    pub fn solid(colors: [Rgba; BACKPACK_LED_COUNT]) -> Self {
        Self {
            on_colors: colors,
            off_colors: colors,
            on_period_ms: [u32::MAX; BACKPACK_LED_COUNT],
            ..Self::default()
        }
    }

    /// Blink every LED between `on` and `off`.
    pub fn blinking(on: Rgba, off: Rgba, on_ms: u32, off_ms: u32) -> Self {
        Self {
            on_colors: [on; BACKPACK_LED_COUNT],
            off_colors: [off; BACKPACK_LED_COUNT],
            on_period_ms: [on_ms; BACKPACK_LED_COUNT],
            off_period_ms: [off_ms; BACKPACK_LED_COUNT],
            ..Self::default()
        }
    }
}
