//! Keyframes: one timed event per entry, closed over the supported variants.
//!
//! A keyframe is immutable authored data. Everything that changes while it plays
//! (activation time, face frame index, interpolation clock, audio selection)
//! lives in [`KeyframeState`], owned by the channel cursor that is playing it.
//!
//! Per tick the playback asks the keyframe for a message with
//! [`Keyframe::stream_message`] and then whether it has finished with
//! [`Keyframe::is_done`]; the cursor advances only on `true`.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use animstream_api_core::{
    clamp_narrow, AudioChunkProvider, BackpackLights, DeviceMessage, FrameProvider,
    ProceduralFaceParams, RandomSource, Rgba, TurnToHeading, BACKPACK_LED_COUNT,
};

use crate::audio::select_index;
use crate::config::Config;
use crate::face::interpolate;
use crate::track::Channel;

/// Turning radius of a body motion.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curvature {
    Straight,
    PointTurn,
    RadiusMm(i32),
}

impl Curvature {
    /// On-wire radius: straight is encoded as `i16::MAX`, a point turn as 0.
    pub fn wire_radius_mm(self) -> i16 {
        match self {
            Curvature::Straight => i16::MAX,
            Curvature::PointTurn => 0,
            Curvature::RadiusMm(r) => clamp_narrow(r as i64, "BodyMotion.radius_mm"),
        }
    }
}

/// One weighted alternative of a RobotAudio keyframe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioRef {
    pub event_id: u32,
    pub volume: f32,
    pub probability: f32,
    pub has_alternates: bool,
}

impl AudioRef {
    pub fn new(event_id: u32) -> Self {
        Self {
            event_id,
            volume: 1.0,
            probability: 1.0,
            has_alternates: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum KeyframeKind {
    HeadAngle {
        angle_deg: i32,
        variability_deg: i32,
        duration_ms: u32,
    },
    LiftHeight {
        height_mm: i32,
        variability_mm: i32,
        duration_ms: u32,
    },
    BodyMotion {
        speed_mmps: i32,
        accel_mmps2: i32,
        curvature: Curvature,
        duration_ms: u32,
        stop_message_enabled: bool,
    },
    RecordHeading,
    TurnToRecordedHeading {
        offset_deg: i32,
        speed_deg_per_sec: i32,
        accel_deg_per_sec2: i32,
        decel_deg_per_sec2: i32,
        tolerance_deg: i32,
        num_half_revs: i32,
        use_shortest_dir: bool,
        duration_ms: u32,
    },
    FaceImage {
        image_id: u32,
    },
    FaceAnimation {
        animation_name: String,
        scanline_opacity: f32,
    },
    ProceduralFace {
        face: ProceduralFaceParams,
    },
    RobotAudio {
        references: Vec<AudioRef>,
    },
    BackpackLights {
        colors: [Rgba; BACKPACK_LED_COUNT],
        duration_ms: u32,
    },
    Event {
        event_id: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    /// Offset from animation start.
    pub trigger_time_ms: u32,
    pub kind: KeyframeKind,
}

/// Runtime state of the keyframe under a channel cursor. Reset on advance.
#[derive(Clone, Debug, Default)]
pub struct KeyframeState {
    activated: bool,
    started_at_ms: u32,
    stop_sent: bool,
    face_frame: usize,
    face_time_ms: u32,
    face_done: bool,
    audio_selected: bool,
    audio_selection: Option<usize>,
    audio_chunk: usize,
}

impl KeyframeState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns the procedural-face done flag and clears it.
    pub fn consume_done_flag(&mut self) -> bool {
        std::mem::take(&mut self.face_done)
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Frames of a face animation streamed so far.
    pub fn face_frame(&self) -> usize {
        self.face_frame
    }

    /// Index of the chosen audio alternative; `None` before selection or when nothing was picked.
    pub fn audio_selection(&self) -> Option<usize> {
        self.audio_selection
    }

    fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.saturating_sub(self.started_at_ms)
    }
}

/// Everything a keyframe may consult while streaming.
pub struct KeyframeContext<'a> {
    pub config: &'a Config,
    pub frames: &'a dyn FrameProvider,
    pub audio: &'a dyn AudioChunkProvider,
    pub rng: &'a mut dyn RandomSource,
    /// Animation-relative time of this tick.
    pub now_ms: u32,
    /// Time elapsed since the previous tick.
    pub dt_ms: u32,
}

impl Keyframe {
    pub fn new(trigger_time_ms: u32, kind: KeyframeKind) -> Self {
        Self {
            trigger_time_ms,
            kind,
        }
    }

    pub fn head_angle(trigger_time_ms: u32, angle_deg: i32, variability_deg: i32, duration_ms: u32) -> Self {
        Self::new(
            trigger_time_ms,
            KeyframeKind::HeadAngle {
                angle_deg,
                variability_deg,
                duration_ms,
            },
        )
    }

    pub fn lift_height(trigger_time_ms: u32, height_mm: i32, variability_mm: i32, duration_ms: u32) -> Self {
        Self::new(
            trigger_time_ms,
            KeyframeKind::LiftHeight {
                height_mm,
                variability_mm,
                duration_ms,
            },
        )
    }

    pub fn body_motion(trigger_time_ms: u32, speed_mmps: i32, curvature: Curvature, duration_ms: u32) -> Self {
        Self::new(
            trigger_time_ms,
            KeyframeKind::BodyMotion {
                speed_mmps,
                accel_mmps2: 0,
                curvature,
                duration_ms,
                stop_message_enabled: true,
            },
        )
    }

    pub fn face_animation(trigger_time_ms: u32, animation_name: impl Into<String>) -> Self {
        Self::new(
            trigger_time_ms,
            KeyframeKind::FaceAnimation {
                animation_name: animation_name.into(),
                scanline_opacity: 1.0,
            },
        )
    }

    pub fn procedural_face(trigger_time_ms: u32, face: ProceduralFaceParams) -> Self {
        Self::new(trigger_time_ms, KeyframeKind::ProceduralFace { face })
    }

    pub fn robot_audio(trigger_time_ms: u32, references: Vec<AudioRef>) -> Self {
        Self::new(trigger_time_ms, KeyframeKind::RobotAudio { references })
    }

    pub fn event(trigger_time_ms: u32, event_id: impl Into<String>) -> Self {
        Self::new(
            trigger_time_ms,
            KeyframeKind::Event {
                event_id: event_id.into(),
            },
        )
    }

    pub fn channel(&self) -> Channel {
        match self.kind {
            KeyframeKind::HeadAngle { .. } => Channel::Head,
            KeyframeKind::LiftHeight { .. } => Channel::Lift,
            KeyframeKind::BodyMotion { .. }
            | KeyframeKind::RecordHeading
            | KeyframeKind::TurnToRecordedHeading { .. } => Channel::Body,
            KeyframeKind::FaceImage { .. }
            | KeyframeKind::FaceAnimation { .. }
            | KeyframeKind::ProceduralFace { .. } => Channel::Face,
            KeyframeKind::RobotAudio { .. } => Channel::Audio,
            KeyframeKind::BackpackLights { .. } => Channel::Backpack,
            KeyframeKind::Event { .. } => Channel::Event,
        }
    }

    /// Authored duration; zero for variants without one.
    pub fn duration_ms(&self) -> u32 {
        match self.kind {
            KeyframeKind::HeadAngle { duration_ms, .. }
            | KeyframeKind::LiftHeight { duration_ms, .. }
            | KeyframeKind::BodyMotion { duration_ms, .. }
            | KeyframeKind::TurnToRecordedHeading { duration_ms, .. }
            | KeyframeKind::BackpackLights { duration_ms, .. } => duration_ms,
            _ => 0,
        }
    }

    #[inline]
    pub fn is_time_to_play(&self, now_ms: u32) -> bool {
        self.trigger_time_ms <= now_ms
    }

    /// Message to send this tick, if any. `next` is the following keyframe on the
    /// same channel, used as the interpolation target of procedural faces.
    pub fn stream_message(
        &self,
        state: &mut KeyframeState,
        next: Option<&Keyframe>,
        ctx: &mut KeyframeContext<'_>,
    ) -> Option<DeviceMessage> {
        let first_tick = !state.activated;
        if first_tick {
            state.activated = true;
            state.started_at_ms = ctx.now_ms;
            state.face_time_ms = self.trigger_time_ms;
        }

        match &self.kind {
            KeyframeKind::HeadAngle {
                angle_deg,
                variability_deg,
                duration_ms,
            } => first_tick.then(|| DeviceMessage::HeadAngle {
                angle_deg: clamp_narrow(
                    jitter(*angle_deg, *variability_deg, ctx.rng) as i64,
                    "HeadAngle.angle_deg",
                ),
                duration_ms: clamp_narrow(*duration_ms as i64, "HeadAngle.duration_ms"),
            }),
            KeyframeKind::LiftHeight {
                height_mm,
                variability_mm,
                duration_ms,
            } => first_tick.then(|| DeviceMessage::LiftHeight {
                height_mm: clamp_narrow(
                    jitter(*height_mm, *variability_mm, ctx.rng) as i64,
                    "LiftHeight.height_mm",
                ),
                duration_ms: clamp_narrow(*duration_ms as i64, "LiftHeight.duration_ms"),
            }),
            KeyframeKind::BodyMotion {
                speed_mmps,
                accel_mmps2,
                curvature,
                duration_ms,
                stop_message_enabled,
            } => {
                if first_tick {
                    Some(DeviceMessage::BodyMotion {
                        speed_mmps: clamp_narrow(*speed_mmps as i64, "BodyMotion.speed"),
                        accel_mmps2: clamp_narrow(*accel_mmps2 as i64, "BodyMotion.accel"),
                        curvature_radius_mm: curvature.wire_radius_mm(),
                    })
                } else if *stop_message_enabled
                    && !state.stop_sent
                    && state.elapsed_ms(ctx.now_ms) >= *duration_ms
                {
                    state.stop_sent = true;
                    Some(DeviceMessage::BodyMotion {
                        speed_mmps: 0,
                        accel_mmps2: clamp_narrow(*accel_mmps2 as i64, "BodyMotion.accel"),
                        curvature_radius_mm: curvature.wire_radius_mm(),
                    })
                } else {
                    None
                }
            }
            KeyframeKind::RecordHeading => first_tick.then_some(DeviceMessage::RecordHeading),
            KeyframeKind::TurnToRecordedHeading {
                offset_deg,
                speed_deg_per_sec,
                accel_deg_per_sec2,
                decel_deg_per_sec2,
                tolerance_deg,
                num_half_revs,
                use_shortest_dir,
                ..
            } => first_tick.then(|| {
                DeviceMessage::TurnToRecordedHeading(TurnToHeading {
                    offset_deg: clamp_narrow(*offset_deg as i64, "TurnToRecordedHeading.offset_deg"),
                    speed_deg_per_sec: clamp_narrow(*speed_deg_per_sec as i64, "TurnToRecordedHeading.speed"),
                    accel_deg_per_sec2: clamp_narrow(*accel_deg_per_sec2 as i64, "TurnToRecordedHeading.accel"),
                    decel_deg_per_sec2: clamp_narrow(*decel_deg_per_sec2 as i64, "TurnToRecordedHeading.decel"),
                    tolerance_deg: clamp_narrow(*tolerance_deg as i64, "TurnToRecordedHeading.tolerance_deg"),
                    num_half_revs: clamp_narrow(*num_half_revs as i64, "TurnToRecordedHeading.num_half_revs"),
                    use_shortest_dir: *use_shortest_dir,
                })
            }),
            KeyframeKind::FaceImage { image_id } => {
                first_tick.then_some(DeviceMessage::FaceImage { image_id: *image_id })
            }
            KeyframeKind::FaceAnimation {
                animation_name,
                scanline_opacity,
            } => stream_face_frame(animation_name, *scanline_opacity, state, ctx),
            KeyframeKind::ProceduralFace { face } => {
                let target = next.and_then(|kf| match &kf.kind {
                    KeyframeKind::ProceduralFace { face } => Some((kf.trigger_time_ms, face)),
                    _ => None,
                });
                let out = match target {
                    Some((next_trigger, next_face)) => {
                        let blended = interpolate(
                            face,
                            next_face,
                            self.trigger_time_ms,
                            next_trigger,
                            state.face_time_ms,
                        );
                        state.face_time_ms = state.face_time_ms.saturating_add(ctx.dt_ms);
                        if state.face_time_ms >= next_trigger {
                            state.face_done = true;
                        }
                        blended
                    }
                    None => {
                        state.face_done = true;
                        face.clone()
                    }
                };
                Some(DeviceMessage::ProceduralFace(out))
            }
            KeyframeKind::RobotAudio { references } => {
                if !state.audio_selected {
                    state.audio_selected = true;
                    state.audio_selection =
                        select_index(references, ctx.config.use_audio_probability, ctx.rng);
                    return match state.audio_selection.and_then(|i| references.get(i)) {
                        Some(r) => Some(DeviceMessage::PostAudioEvent {
                            event_id: r.event_id,
                            volume: r.volume,
                        }),
                        None => {
                            debug!("RobotAudio: no audio reference selected, playing silence");
                            None
                        }
                    };
                }
                let r = state.audio_selection.and_then(|i| references.get(i))?;
                if state.audio_chunk < ctx.audio.chunk_count(r.event_id) {
                    let chunk_index = clamp_narrow(state.audio_chunk as i64, "RobotAudio.chunk_index");
                    state.audio_chunk += 1;
                    Some(DeviceMessage::AudioChunk {
                        event_id: r.event_id,
                        chunk_index,
                    })
                } else {
                    None
                }
            }
            KeyframeKind::BackpackLights { colors, .. } => {
                first_tick.then(|| DeviceMessage::BackpackLights(BackpackLights::solid(*colors)))
            }
            KeyframeKind::Event { event_id } => first_tick.then(|| DeviceMessage::Event {
                event_id: event_id.clone(),
            }),
        }
    }

    /// Whether the cursor may move past this keyframe. Must follow `stream_message`
    /// in the same tick. Procedural faces consume their done flag here.
    pub fn is_done(&self, state: &mut KeyframeState, ctx: &KeyframeContext<'_>) -> bool {
        match &self.kind {
            KeyframeKind::HeadAngle { duration_ms, .. }
            | KeyframeKind::LiftHeight { duration_ms, .. }
            | KeyframeKind::TurnToRecordedHeading { duration_ms, .. }
            | KeyframeKind::BackpackLights { duration_ms, .. } => {
                state.elapsed_ms(ctx.now_ms) >= *duration_ms
            }
            KeyframeKind::BodyMotion {
                stop_message_enabled,
                ..
            } => !*stop_message_enabled || state.stop_sent,
            KeyframeKind::FaceAnimation { animation_name, .. } => {
                state.face_frame >= ctx.frames.frame_count(animation_name)
            }
            KeyframeKind::ProceduralFace { .. } => state.consume_done_flag(),
            KeyframeKind::RobotAudio { references } => {
                if !state.audio_selected {
                    return false;
                }
                match state.audio_selection.and_then(|i| references.get(i)) {
                    Some(r) => state.audio_chunk >= ctx.audio.chunk_count(r.event_id),
                    None => true,
                }
            }
            KeyframeKind::RecordHeading | KeyframeKind::FaceImage { .. } | KeyframeKind::Event { .. } => true,
        }
    }

    /// The audio alternative picked for this keyframe. Asking before the first
    /// tick is an invalid request: it is logged and answered with `None`.
    pub fn selected_audio<'k>(&'k self, state: &KeyframeState) -> Option<&'k AudioRef> {
        let KeyframeKind::RobotAudio { references } = &self.kind else {
            warn!("selected_audio requested on a non-audio keyframe");
            return None;
        };
        if !state.audio_selected {
            warn!("selected_audio requested before the audio keyframe was played");
            return None;
        }
        state.audio_selection.and_then(|i| references.get(i))
    }
}

fn jitter(value: i32, variability: i32, rng: &mut dyn RandomSource) -> i32 {
    if variability == 0 {
        return value;
    }
    rng.int_in_range(value.saturating_sub(variability), value.saturating_add(variability))
}

fn stream_face_frame(
    name: &str,
    scanline_opacity: f32,
    state: &mut KeyframeState,
    ctx: &KeyframeContext<'_>,
) -> Option<DeviceMessage> {
    if state.face_frame >= ctx.frames.frame_count(name) {
        return None;
    }
    let Some(frame) = ctx.frames.frame(name, state.face_frame) else {
        warn!("FaceAnimation '{name}': frame {} missing", state.face_frame);
        return None;
    };
    let index = state.face_frame;
    state.face_frame += 1;
    if frame.is_empty() {
        return None;
    }
    Some(DeviceMessage::FaceFrame {
        animation: name.to_string(),
        frame_index: clamp_narrow(index as i64, "FaceAnimation.frame_index"),
        scanline_opacity,
        data: frame.data,
    })
}
