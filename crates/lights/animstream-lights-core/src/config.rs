#![allow(dead_code)]
//! Configuration for the cube and backpack light schedulers.

use serde::{Deserialize, Serialize};

use animstream_api_core::{BackpackLights, PoseState, Rgba};

/// Triggers picked for the default layer from an object's last-known state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultLightTable {
    pub unknown: String,
    pub connected: String,
    pub visible: String,
    pub carrying: String,
    pub sleep: String,
    pub sleep_no_fade: String,
}

impl DefaultLightTable {
    pub fn lookup(&self, pose: PoseState) -> &str {
        match pose {
            PoseState::Unknown => &self.unknown,
            PoseState::Connected => &self.connected,
            PoseState::Visible => &self.visible,
            PoseState::Carrying => &self.carrying,
        }
    }
}

impl Default for DefaultLightTable {
    fn default() -> Self {
        Self {
            unknown: "Connected".into(),
            connected: "Connected".into(),
            visible: "Visible".into(),
            carrying: "Carrying".into(),
            sleep: "Sleep".into(),
            sleep_no_fade: "SleepNoFade".into(),
        }
    }
}

/// Backpack lights shown on the default layer for each charger state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackpackTable {
    pub off_charger: BackpackLights,
    pub charging: BackpackLights,
    pub charged: BackpackLights,
    pub bad_charger: BackpackLights,
}

impl Default for BackpackTable {
    fn default() -> Self {
        Self {
            off_charger: BackpackLights::off(),
            charging: BackpackLights::blinking(Rgba::GREEN, Rgba::OFF, 600, 600),
            charged: BackpackLights::solid([Rgba::GREEN; animstream_api_core::BACKPACK_LED_COUNT]),
            bad_charger: BackpackLights::blinking(Rgba::RED, Rgba::OFF, 200, 200),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightsConfig {
    /// Duration of one cube LED frame on the wire.
    pub led_frame_ms: u32,
    /// Green/blue scale applied to colors containing red before sending to cubes.
    pub white_balance_green_blue_scale: f32,
    pub default_table: DefaultLightTable,
    /// Played on the default layer when an object connects.
    pub wake_up_trigger: String,
    pub backpack: BackpackTable,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            led_frame_ms: 30,
            white_balance_green_blue_scale: 0.6,
            default_table: DefaultLightTable::default(),
            wake_up_trigger: "WakeUp".into(),
            backpack: BackpackTable::default(),
        }
    }
}
