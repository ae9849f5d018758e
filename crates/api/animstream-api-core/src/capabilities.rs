//! Capability traits handed to the engine and schedulers at construction.
//!
//! Everything outside the streaming core (transport, face frame storage, audio
//! chunking, object pose tracking) is reached only through these seams.

use serde::{Deserialize, Serialize};

use crate::message::{DeviceMessage, ObjectId};

/// Fire-and-forget sink for device messages.
pub trait DeviceTransport {
    /// Returns `false` when the message could not be handed off. No retry is expected.
    fn send(&mut self, message: &DeviceMessage) -> bool;
}

/// One frame of a face animation. An empty frame holds the previous image.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceFrame {
    pub data: Vec<u8>,
}

impl FaceFrame {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Source of face animation frames. Counts may grow while playing, so callers
/// re-query `frame_count` on every check.
pub trait FrameProvider {
    fn frame_count(&self, name: &str) -> usize;
    fn frame(&self, name: &str, index: usize) -> Option<FaceFrame>;
}

/// Source of audio chunk counts for a selected audio event.
pub trait AudioChunkProvider {
    fn chunk_count(&self, event_id: u32) -> usize;
}

/// Last-known state of a light-bearing object, keyed for default-layer selection.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PoseState {
    #[default]
    Unknown,
    Connected,
    Visible,
    Carrying,
}

pub trait PoseStateProvider {
    fn pose_state(&self, object: ObjectId) -> PoseState;
}

/// Provider with no face animations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFrames;

impl FrameProvider for NullFrames {
    fn frame_count(&self, _name: &str) -> usize {
        0
    }
    fn frame(&self, _name: &str, _index: usize) -> Option<FaceFrame> {
        None
    }
}

/// Provider where every audio event has no chunks.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioChunkProvider for NullAudio {
    fn chunk_count(&self, _event_id: u32) -> usize {
        0
    }
}

impl PoseStateProvider for PoseState {
    fn pose_state(&self, _object: ObjectId) -> PoseState {
        *self
    }
}

/// Transport that records everything it is given; `fail_every` simulates drops.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<DeviceMessage>,
    pub fail_every: Option<usize>,
    attempts: usize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_every(n: usize) -> Self {
        Self {
            fail_every: Some(n.max(1)),
            ..Self::default()
        }
    }
}

impl DeviceTransport for RecordingTransport {
    fn send(&mut self, message: &DeviceMessage) -> bool {
        self.attempts += 1;
        if let Some(n) = self.fail_every {
            if self.attempts % n == 0 {
                return false;
            }
        }
        self.sent.push(message.clone());
        true
    }
}
