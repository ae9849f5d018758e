//! animstream-api-core: device-facing value types and the capability traits
//! the timeline engine and light schedulers are constructed with.

pub mod capabilities;
pub mod color;
pub mod face;
pub mod lights;
pub mod message;
pub mod numeric;
pub mod random;

pub use capabilities::{
    AudioChunkProvider, DeviceTransport, FaceFrame, FrameProvider, NullAudio, NullFrames,
    PoseState, PoseStateProvider, RecordingTransport,
};
pub use color::Rgba;
pub use face::{EyeParam, ProceduralFaceParams, EYE_PARAM_COUNT};
pub use lights::{
    BackpackLights, CubeLightsFrame, MakeRelativeMode, ObjectLights, BACKPACK_LED_COUNT,
    CUBE_LED_COUNT,
};
pub use message::{DeviceMessage, ObjectId, TurnToHeading};
pub use numeric::{clamp_narrow, clamp_narrow_f32, NarrowTarget};
pub use random::{PcgRandom, RandomSource};
