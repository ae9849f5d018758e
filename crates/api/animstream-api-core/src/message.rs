//! Messages streamed to the device.

use serde::{Deserialize, Serialize};

use crate::face::ProceduralFaceParams;
use crate::lights::{BackpackLights, CubeLightsFrame};

/// Identifier of a physical light-bearing object (cube).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Payload of a turn back to a previously recorded heading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnToHeading {
    pub offset_deg: i16,
    pub speed_deg_per_sec: i16,
    pub accel_deg_per_sec2: i16,
    pub decel_deg_per_sec2: i16,
    pub tolerance_deg: u16,
    pub num_half_revs: u16,
    pub use_shortest_dir: bool,
}

/// One device-bound command. Integer widths match the wire fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DeviceMessage {
    HeadAngle {
        angle_deg: i8,
        duration_ms: u16,
    },
    LiftHeight {
        height_mm: u8,
        duration_ms: u16,
    },
    BodyMotion {
        speed_mmps: i16,
        accel_mmps2: i16,
        curvature_radius_mm: i16,
    },
    RecordHeading,
    TurnToRecordedHeading(TurnToHeading),
    FaceImage {
        image_id: u32,
    },
    FaceFrame {
        animation: String,
        frame_index: u32,
        scanline_opacity: f32,
        data: Vec<u8>,
    },
    ProceduralFace(ProceduralFaceParams),
    PostAudioEvent {
        event_id: u32,
        volume: f32,
    },
    AudioChunk {
        event_id: u32,
        chunk_index: u32,
    },
    BackpackLights(BackpackLights),
    Event {
        event_id: String,
    },
    /// Cube lights already encoded for the device (LED frames, white balance).
    SetObjectLights {
        object: ObjectId,
        lights: CubeLightsFrame,
    },
}

impl DeviceMessage {
    /// Short kind label used in logs and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceMessage::HeadAngle { .. } => "HeadAngle",
            DeviceMessage::LiftHeight { .. } => "LiftHeight",
            DeviceMessage::BodyMotion { .. } => "BodyMotion",
            DeviceMessage::RecordHeading => "RecordHeading",
            DeviceMessage::TurnToRecordedHeading(_) => "TurnToRecordedHeading",
            DeviceMessage::FaceImage { .. } => "FaceImage",
            DeviceMessage::FaceFrame { .. } => "FaceFrame",
            DeviceMessage::ProceduralFace(_) => "ProceduralFace",
            DeviceMessage::PostAudioEvent { .. } => "PostAudioEvent",
            DeviceMessage::AudioChunk { .. } => "AudioChunk",
            DeviceMessage::BackpackLights(_) => "BackpackLights",
            DeviceMessage::Event { .. } => "Event",
            DeviceMessage::SetObjectLights { .. } => "SetObjectLights",
        }
    }
}
