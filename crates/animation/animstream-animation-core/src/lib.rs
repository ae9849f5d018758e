#![allow(dead_code)]
//! animstream animation core (engine-agnostic)
//!
//! Turns authored keyframe animations into the per-tick stream of device
//! messages: keyframe variants and their completion rules, per-channel tracks,
//! playback cursors, audio alternative selection, procedural face blending,
//! and the JSON loader for authored animations.

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod face;
pub mod ids;
pub mod inputs;
pub mod keyframe;
pub mod library;
pub mod outputs;
pub mod playback;
pub mod stored_animation;
pub mod track;

// Re-exports for consumers (orchestrator, hosts)
pub use audio::select_index;
pub use config::Config;
pub use engine::{Capabilities, Engine};
pub use error::LoadError;
pub use face::interpolate;
pub use ids::{AnimId, InstId};
pub use inputs::{Inputs, PlaybackCommand};
pub use keyframe::{AudioRef, Curvature, Keyframe, KeyframeContext, KeyframeKind, KeyframeState};
pub use library::{AnimationLibrary, LoadReport, TrackSource};
pub use outputs::{CoreEvent, Outputs, StreamedMessage};
pub use playback::{PassState, PlaybackInstance};
pub use stored_animation::{parse_animation, parse_animations_json, ParsedAnimation};
pub use track::{Channel, Track, CHANNEL_COUNT};
pub use animstream_api_core::DeviceMessage;
