//! animstream-lights-core: layered light scheduling for cube and backpack LEDs.
//!
//! Each object keeps one stack of playing light anims per priority layer
//! (User > Behavior > Default). Every tick the highest non-empty layer is
//! shown, its current pattern is stepped, and a `SetObjectLights` message
//! carrying the device encoding is produced only when the object's LED state
//! actually changes.

pub mod backpack;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod layer;
pub mod library;
pub mod pattern;
pub mod scheduler;

pub use backpack::{BackpackLightScheduler, ChargerState};
pub use callbacks::{Callback, CallbackHandle, CallbackRegistry};
pub use config::{BackpackTable, DefaultLightTable, LightsConfig};
pub use error::{LightLoadError, PlayError};
pub use layer::{CurrentAnimInfo, LayerStack, LightLayer, ObjectLightState, Step, LAYER_COUNT};
pub use library::{LightAnimLibrary, LightAnimSource, LightLoadReport};
pub use pattern::{apply_modifier, LightAnim, LightPattern};
pub use scheduler::{CubeLightScheduler, ObjectSelector, PlayOptions, SleepMode};
