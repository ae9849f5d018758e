#![allow(dead_code)]
//! Core configuration for animstream-animation-core.

use serde::{Deserialize, Serialize};

/// Streaming cadence and motion limits applied while loading and playing keyframes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed control tick; also the step used to advance procedural face interpolation.
    pub tick_ms: u32,

    /// Straight and arc body motion speeds are clamped to this magnitude at load.
    pub max_wheel_speed_mmps: i32,
    /// Point turns and recorded-heading turns are clamped to these rotation limits.
    pub max_body_rotation_speed_deg_per_sec: i32,
    pub max_body_rotation_accel_deg_per_sec2: i32,

    /// Honor authored audio probabilities; when false, alternates are picked uniformly.
    pub use_audio_probability: bool,

    /// Seed for the engine's random source. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 33,
            max_wheel_speed_mmps: 220,
            max_body_rotation_speed_deg_per_sec: 300,
            max_body_rotation_accel_deg_per_sec2: 10_000,
            use_audio_probability: true,
            rng_seed: None,
        }
    }
}
