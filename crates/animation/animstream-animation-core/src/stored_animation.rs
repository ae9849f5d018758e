//! Parse authored animation JSON into tracks.
//!
//! Document shape: `{ "<animation name>": [ keyframe, ... ], ... }` where each
//! keyframe carries its class in `"Name"` and its offset in `"triggerTime_ms"`.
//!
//! Notes:
//! - One malformed keyframe fails its whole animation; sibling animations still load.
//! - Wide authored integers are clamp-narrowed (see `animstream_api_core::numeric`).
//! - Body motion speeds are clamped to the configured wheel/rotation limits.

use log::warn;
use serde::Deserialize;

use animstream_api_core::{clamp_narrow, ProceduralFaceParams, Rgba, EYE_PARAM_COUNT};

use crate::audio::{equal_probabilities, PROBABILITY_SUM_TOLERANCE};
use crate::config::Config;
use crate::error::LoadError;
use crate::keyframe::{AudioRef, Curvature, Keyframe, KeyframeKind};
use crate::track::Track;

/// One animation from a document, loaded or rejected.
#[derive(Debug)]
pub struct ParsedAnimation {
    pub name: String,
    pub result: Result<Track, LoadError>,
}

/// Public API: parse a whole animation document. Only invalid JSON or a
/// non-object root fails as a whole.
pub fn parse_animations_json(s: &str, cfg: &Config) -> Result<Vec<ParsedAnimation>, LoadError> {
    let doc: serde_json::Map<String, serde_json::Value> = serde_json::from_str(s)?;
    Ok(doc
        .into_iter()
        .map(|(name, frames)| {
            let result = parse_animation(&name, frames, cfg);
            ParsedAnimation { name, result }
        })
        .collect())
}

/// Parse the keyframe array of a single animation.
pub fn parse_animation(name: &str, frames: serde_json::Value, cfg: &Config) -> Result<Track, LoadError> {
    let serde_json::Value::Array(frames) = frames else {
        return Err(LoadError::NotAnArray {
            animation: name.to_string(),
        });
    };
    let mut track = Track::new(name);
    for (index, frame) in frames.into_iter().enumerate() {
        let raw: RawFrame = serde_json::from_value(frame).map_err(|e| LoadError::Malformed {
            animation: name.to_string(),
            index,
            reason: e.to_string(),
        })?;
        let at = Loc { animation: name, index };
        track.push(raw.into_keyframe(&at, cfg)?);
    }
    track.sort();
    Ok(track)
}

struct Loc<'a> {
    animation: &'a str,
    index: usize,
}

impl Loc<'_> {
    fn malformed(&self, reason: impl Into<String>) -> LoadError {
        LoadError::Malformed {
            animation: self.animation.to_string(),
            index: self.index,
            reason: reason.into(),
        }
    }
}

fn narrow_f64<T: animstream_api_core::NarrowTarget>(v: f64, context: &str) -> T {
    // `as` saturates; NaN becomes 0.
    clamp_narrow(v.round() as i64, context)
}

fn clamp_magnitude(value: i32, limit: i32, what: &str, animation: &str) -> i32 {
    let limit = limit.abs();
    if value.abs() > limit {
        warn!("{animation}: {what} {value} exceeds limit {limit}, clamping");
        value.clamp(-limit, limit)
    } else {
        value
    }
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "triggerTime_ms")]
    trigger_time_ms: u64,
    #[serde(flatten)]
    kind: RawKind,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "Name")]
enum RawKind {
    #[serde(rename = "HeadAngleKeyFrame")]
    HeadAngle {
        #[serde(rename = "durationTime_ms")]
        duration_ms: u64,
        angle_deg: f64,
        #[serde(rename = "angleVariability_deg", default)]
        variability_deg: f64,
    },
    #[serde(rename = "LiftHeightKeyFrame")]
    LiftHeight {
        #[serde(rename = "durationTime_ms")]
        duration_ms: u64,
        height_mm: f64,
        #[serde(rename = "heightVariability_mm", default)]
        variability_mm: f64,
    },
    #[serde(rename = "BodyMotionKeyFrame")]
    BodyMotion {
        #[serde(rename = "durationTime_ms")]
        duration_ms: u64,
        speed: f64,
        #[serde(default)]
        accel_mmps2: f64,
        radius_mm: RawRadius,
        #[serde(rename = "enableStopMessage", default = "default_true")]
        stop_message_enabled: bool,
    },
    #[serde(rename = "RecordHeadingKeyFrame")]
    RecordHeading {},
    #[serde(rename = "TurnToRecordedHeadingKeyFrame")]
    TurnToRecordedHeading {
        #[serde(rename = "durationTime_ms")]
        duration_ms: u64,
        #[serde(default)]
        offset_deg: f64,
        #[serde(rename = "speed_degPerSec")]
        speed: f64,
        #[serde(rename = "accel_degPerSec2")]
        accel: f64,
        #[serde(rename = "decel_degPerSec2")]
        decel: f64,
        #[serde(default)]
        tolerance_deg: f64,
        #[serde(rename = "numHalfRevs", default)]
        num_half_revs: f64,
        #[serde(rename = "useShortestDir", default)]
        use_shortest_dir: bool,
    },
    #[serde(rename = "FaceImageKeyFrame")]
    FaceImage {
        #[serde(rename = "imageID")]
        image_id: u64,
    },
    #[serde(rename = "FaceAnimationKeyFrame")]
    FaceAnimation {
        #[serde(rename = "animName")]
        animation_name: String,
        #[serde(rename = "scanlineOpacity", default = "default_one")]
        scanline_opacity: f32,
    },
    #[serde(rename = "ProceduralFaceKeyFrame")]
    ProceduralFace {
        #[serde(rename = "faceAngle", default)]
        face_angle: f32,
        #[serde(rename = "faceCenterX", default)]
        face_center_x: f32,
        #[serde(rename = "faceCenterY", default)]
        face_center_y: f32,
        #[serde(rename = "faceScaleX", default = "default_one")]
        face_scale_x: f32,
        #[serde(rename = "faceScaleY", default = "default_one")]
        face_scale_y: f32,
        #[serde(rename = "leftEye", default)]
        left_eye: Vec<f32>,
        #[serde(rename = "rightEye", default)]
        right_eye: Vec<f32>,
    },
    #[serde(rename = "RobotAudioKeyFrame")]
    RobotAudio {
        #[serde(rename = "audioEventId")]
        event_ids: OneOrMany<u64>,
        #[serde(default = "default_one")]
        volume: f32,
        #[serde(default)]
        probability: Option<OneOrMany<f32>>,
        #[serde(rename = "hasAlts", default)]
        has_alternates: bool,
    },
    #[serde(rename = "BackpackLightsKeyFrame")]
    BackpackLights {
        #[serde(rename = "durationTime_ms")]
        duration_ms: u64,
        #[serde(rename = "Back")]
        back: [f32; 4],
        #[serde(rename = "Front")]
        front: [f32; 4],
        #[serde(rename = "Middle")]
        middle: [f32; 4],
        #[serde(rename = "Left")]
        left: [f32; 4],
        #[serde(rename = "Right")]
        right: [f32; 4],
    },
    #[serde(rename = "EventKeyFrame")]
    Event { event_id: serde_json::Value },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRadius {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn eye_from(values: Vec<f32>) -> [f32; EYE_PARAM_COUNT] {
    let mut eye = ProceduralFaceParams::neutral_eye();
    for (slot, v) in eye.iter_mut().zip(values) {
        *slot = v;
    }
    eye
}

impl RawFrame {
    fn into_keyframe(self, at: &Loc<'_>, cfg: &Config) -> Result<Keyframe, LoadError> {
        let trigger: u32 = clamp_narrow(
            i64::try_from(self.trigger_time_ms).unwrap_or(i64::MAX),
            "triggerTime_ms",
        );
        let duration = |ms: u64| -> u32 {
            clamp_narrow(i64::try_from(ms).unwrap_or(i64::MAX), "durationTime_ms")
        };

        let kind = match self.kind {
            RawKind::HeadAngle {
                duration_ms,
                angle_deg,
                variability_deg,
            } => KeyframeKind::HeadAngle {
                angle_deg: narrow_f64(angle_deg, "angle_deg"),
                variability_deg: narrow_f64(variability_deg, "angleVariability_deg"),
                duration_ms: duration(duration_ms),
            },
            RawKind::LiftHeight {
                duration_ms,
                height_mm,
                variability_mm,
            } => KeyframeKind::LiftHeight {
                height_mm: narrow_f64(height_mm, "height_mm"),
                variability_mm: narrow_f64(variability_mm, "heightVariability_mm"),
                duration_ms: duration(duration_ms),
            },
            RawKind::BodyMotion {
                duration_ms,
                speed,
                accel_mmps2,
                radius_mm,
                stop_message_enabled,
            } => {
                let speed: i32 = narrow_f64(speed, "speed");
                let (curvature, speed) = match radius_mm {
                    RawRadius::Text(s) => match s.as_str() {
                        "TURN_IN_PLACE" | "POINT_TURN" => (
                            Curvature::PointTurn,
                            clamp_magnitude(
                                speed,
                                cfg.max_body_rotation_speed_deg_per_sec,
                                "point turn speed",
                                at.animation,
                            ),
                        ),
                        "STRAIGHT" => (
                            Curvature::Straight,
                            clamp_magnitude(speed, cfg.max_wheel_speed_mmps, "speed", at.animation),
                        ),
                        _ => {
                            return Err(LoadError::UnknownRadius {
                                animation: at.animation.to_string(),
                                index: at.index,
                                radius: s,
                            })
                        }
                    },
                    RawRadius::Number(r) => (
                        Curvature::RadiusMm(narrow_f64(r, "radius_mm")),
                        clamp_magnitude(speed, cfg.max_wheel_speed_mmps, "speed", at.animation),
                    ),
                };
                KeyframeKind::BodyMotion {
                    speed_mmps: speed,
                    accel_mmps2: narrow_f64(accel_mmps2, "accel_mmps2"),
                    curvature,
                    duration_ms: duration(duration_ms),
                    stop_message_enabled,
                }
            }
            RawKind::RecordHeading {} => KeyframeKind::RecordHeading,
            RawKind::TurnToRecordedHeading {
                duration_ms,
                offset_deg,
                speed,
                accel,
                decel,
                tolerance_deg,
                num_half_revs,
                use_shortest_dir,
            } => {
                let speed_limit = cfg.max_body_rotation_speed_deg_per_sec;
                let accel_limit = cfg.max_body_rotation_accel_deg_per_sec2;
                KeyframeKind::TurnToRecordedHeading {
                    offset_deg: narrow_f64(offset_deg, "offset_deg"),
                    speed_deg_per_sec: clamp_magnitude(
                        narrow_f64(speed, "speed_degPerSec"),
                        speed_limit,
                        "turn speed",
                        at.animation,
                    ),
                    accel_deg_per_sec2: clamp_magnitude(
                        narrow_f64(accel, "accel_degPerSec2"),
                        accel_limit,
                        "turn accel",
                        at.animation,
                    ),
                    decel_deg_per_sec2: clamp_magnitude(
                        narrow_f64(decel, "decel_degPerSec2"),
                        accel_limit,
                        "turn decel",
                        at.animation,
                    ),
                    tolerance_deg: narrow_f64(tolerance_deg, "tolerance_deg"),
                    num_half_revs: narrow_f64(num_half_revs, "numHalfRevs"),
                    use_shortest_dir,
                    duration_ms: duration(duration_ms),
                }
            }
            RawKind::FaceImage { image_id } => KeyframeKind::FaceImage {
                image_id: clamp_narrow(i64::try_from(image_id).unwrap_or(i64::MAX), "imageID"),
            },
            RawKind::FaceAnimation {
                animation_name,
                scanline_opacity,
            } => {
                let animation_name = match animation_name.rfind('/') {
                    Some(slash) => {
                        warn!(
                            "{}: removing path from face animation name '{animation_name}'",
                            at.animation
                        );
                        animation_name[slash + 1..].to_string()
                    }
                    None => animation_name,
                };
                KeyframeKind::FaceAnimation {
                    animation_name,
                    scanline_opacity: scanline_opacity.clamp(0.0, 1.0),
                }
            }
            RawKind::ProceduralFace {
                face_angle,
                face_center_x,
                face_center_y,
                face_scale_x,
                face_scale_y,
                left_eye,
                right_eye,
            } => KeyframeKind::ProceduralFace {
                face: ProceduralFaceParams {
                    left_eye: eye_from(left_eye),
                    right_eye: eye_from(right_eye),
                    face_angle_deg: face_angle,
                    face_center: [face_center_x, face_center_y],
                    face_scale: [face_scale_x, face_scale_y],
                },
            },
            RawKind::RobotAudio {
                event_ids,
                volume,
                probability,
                has_alternates,
            } => KeyframeKind::RobotAudio {
                references: audio_references(
                    event_ids.into_vec(),
                    volume,
                    probability.map(OneOrMany::into_vec).unwrap_or_default(),
                    has_alternates,
                    at,
                )?,
            },
            RawKind::BackpackLights {
                duration_ms,
                back,
                front,
                middle,
                left,
                right,
            } => KeyframeKind::BackpackLights {
                colors: [back, front, middle, left, right].map(Rgba::from_unit),
                duration_ms: duration(duration_ms),
            },
            RawKind::Event { event_id } => match event_id {
                serde_json::Value::String(event_id) => KeyframeKind::Event { event_id },
                _ => {
                    return Err(LoadError::EventIdNotString {
                        animation: at.animation.to_string(),
                        index: at.index,
                    })
                }
            },
        };
        Ok(Keyframe::new(trigger, kind))
    }
}

fn audio_references(
    event_ids: Vec<u64>,
    volume: f32,
    mut probabilities: Vec<f32>,
    has_alternates: bool,
    at: &Loc<'_>,
) -> Result<Vec<AudioRef>, LoadError> {
    if event_ids.is_empty() {
        return Err(at.malformed("audioEventId is empty"));
    }
    if probabilities.is_empty() {
        probabilities = equal_probabilities(event_ids.len());
    }
    if probabilities.len() != event_ids.len() {
        return Err(LoadError::ProbabilityCountMismatch {
            animation: at.animation.to_string(),
            index: at.index,
            references: event_ids.len(),
            probabilities: probabilities.len(),
        });
    }

    let mut sum = 0.0f32;
    let mut refs = Vec::with_capacity(event_ids.len());
    for (id, p) in event_ids.into_iter().zip(probabilities) {
        if !(0.0..=1.0).contains(&p) {
            return Err(at.malformed(format!("audio probability {p} outside [0, 1]")));
        }
        sum += p;
        if sum > 1.0 + PROBABILITY_SUM_TOLERANCE {
            return Err(LoadError::ProbabilitySumExceeded {
                animation: at.animation.to_string(),
                index: at.index,
                sum,
            });
        }
        refs.push(AudioRef {
            event_id: clamp_narrow(i64::try_from(id).unwrap_or(i64::MAX), "audioEventId"),
            volume,
            probability: p,
            has_alternates,
        });
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::Channel;

    fn parse_one(json: &str) -> Result<Track, LoadError> {
        let mut all = parse_animations_json(json, &Config::default()).unwrap();
        assert_eq!(all.len(), 1);
        all.remove(0).result
    }

    #[test]
    fn unknown_keyframe_name_is_malformed() {
        let err = parse_one(r#"{ "a": [ { "Name": "WiggleKeyFrame", "triggerTime_ms": 0 } ] }"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::Malformed { index: 0, .. }));
    }

    #[test]
    fn missing_required_field_is_malformed() {
        let err = parse_one(
            r#"{ "a": [ { "Name": "HeadAngleKeyFrame", "triggerTime_ms": 0, "angle_deg": 3 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn body_motion_radius_strings() {
        let track = parse_one(
            r#"{ "a": [
                { "Name": "BodyMotionKeyFrame", "triggerTime_ms": 0, "durationTime_ms": 100, "speed": 900, "radius_mm": "STRAIGHT" },
                { "Name": "BodyMotionKeyFrame", "triggerTime_ms": 100, "durationTime_ms": 100, "speed": -900, "radius_mm": "TURN_IN_PLACE" },
                { "Name": "BodyMotionKeyFrame", "triggerTime_ms": 200, "durationTime_ms": 100, "speed": 50, "radius_mm": 120 }
            ] }"#,
        )
        .unwrap();
        let body = track.keyframes(Channel::Body);
        assert!(matches!(
            body[0].kind,
            KeyframeKind::BodyMotion { speed_mmps: 220, curvature: Curvature::Straight, .. }
        ));
        assert!(matches!(
            body[1].kind,
            KeyframeKind::BodyMotion { speed_mmps: -300, curvature: Curvature::PointTurn, .. }
        ));
        assert!(matches!(
            body[2].kind,
            KeyframeKind::BodyMotion { speed_mmps: 50, curvature: Curvature::RadiusMm(120), .. }
        ));

        let err = parse_one(
            r#"{ "a": [ { "Name": "BodyMotionKeyFrame", "triggerTime_ms": 0, "durationTime_ms": 1, "speed": 1, "radius_mm": "SIDEWAYS" } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::UnknownRadius { .. }));
    }

    #[test]
    fn face_animation_path_is_stripped() {
        let track = parse_one(
            r#"{ "a": [ { "Name": "FaceAnimationKeyFrame", "triggerTime_ms": 0, "animName": "faces/blink/blink_01", "scanlineOpacity": 4.0 } ] }"#,
        )
        .unwrap();
        match &track.keyframes(Channel::Face)[0].kind {
            KeyframeKind::FaceAnimation {
                animation_name,
                scanline_opacity,
            } => {
                assert_eq!(animation_name, "blink_01");
                assert_eq!(*scanline_opacity, 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn audio_probability_rules() {
        let track = parse_one(
            r#"{ "a": [ { "Name": "RobotAudioKeyFrame", "triggerTime_ms": 0, "audioEventId": [1, 2, 3, 4] } ] }"#,
        )
        .unwrap();
        match &track.keyframes(Channel::Audio)[0].kind {
            KeyframeKind::RobotAudio { references } => {
                assert_eq!(references.len(), 4);
                for r in references {
                    assert!((r.probability - 0.25).abs() < 1e-6);
                    assert_eq!(r.volume, 1.0);
                }
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = parse_one(
            r#"{ "a": [ { "Name": "RobotAudioKeyFrame", "triggerTime_ms": 0, "audioEventId": [1, 2], "probability": [0.7, 0.6] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::ProbabilitySumExceeded { .. }));

        let err = parse_one(
            r#"{ "a": [ { "Name": "RobotAudioKeyFrame", "triggerTime_ms": 0, "audioEventId": [1, 2], "probability": 0.5 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::ProbabilityCountMismatch { references: 2, probabilities: 1, .. }
        ));
    }

    #[test]
    fn wide_audio_event_ids_are_clamped() {
        let track = parse_one(
            r#"{ "a": [ { "Name": "RobotAudioKeyFrame", "triggerTime_ms": 0, "audioEventId": 9000000000 } ] }"#,
        )
        .unwrap();
        match &track.keyframes(Channel::Audio)[0].kind {
            KeyframeKind::RobotAudio { references } => assert_eq!(references[0].event_id, u32::MAX),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn event_id_must_be_a_string() {
        let err = parse_one(r#"{ "a": [ { "Name": "EventKeyFrame", "triggerTime_ms": 0, "event_id": 5 } ] }"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::EventIdNotString { .. }));
    }

    #[test]
    fn non_array_animation_fails_alone() {
        let all = parse_animations_json(
            r#"{ "bad": 3, "good": [ { "Name": "RecordHeadingKeyFrame", "triggerTime_ms": 0 } ] }"#,
            &Config::default(),
        )
        .unwrap();
        let bad = all.iter().find(|p| p.name == "bad").unwrap();
        let good = all.iter().find(|p| p.name == "good").unwrap();
        assert!(matches!(bad.result, Err(LoadError::NotAnArray { .. })));
        assert!(good.result.is_ok());
    }
}
