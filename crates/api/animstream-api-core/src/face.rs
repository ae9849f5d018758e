//! Procedural face pose parameters.

use serde::{Deserialize, Serialize};

/// Per-eye parameter slots, in wire order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(usize)]
pub enum EyeParam {
    CenterX,
    CenterY,
    ScaleX,
    ScaleY,
    Angle,
    LowerInnerRadiusX,
    LowerInnerRadiusY,
    UpperInnerRadiusX,
    UpperInnerRadiusY,
    UpperOuterRadiusX,
    UpperOuterRadiusY,
    LowerOuterRadiusX,
    LowerOuterRadiusY,
    UpperLidY,
    UpperLidAngle,
    UpperLidBend,
    LowerLidY,
    LowerLidAngle,
    LowerLidBend,
}

pub const EYE_PARAM_COUNT: usize = EyeParam::LowerLidBend as usize + 1;

/// Full procedural face pose: both eyes plus the global face transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProceduralFaceParams {
    pub left_eye: [f32; EYE_PARAM_COUNT],
    pub right_eye: [f32; EYE_PARAM_COUNT],
    pub face_angle_deg: f32,
    pub face_center: [f32; 2],
    pub face_scale: [f32; 2],
}

impl ProceduralFaceParams {
    /// Neutral eye: unit scale, everything else zero.
    pub fn neutral_eye() -> [f32; EYE_PARAM_COUNT] {
        let mut eye = [0.0; EYE_PARAM_COUNT];
        eye[EyeParam::ScaleX as usize] = 1.0;
        eye[EyeParam::ScaleY as usize] = 1.0;
        eye
    }

    #[inline]
    pub fn left(&self, p: EyeParam) -> f32 {
        self.left_eye[p as usize]
    }

    #[inline]
    pub fn right(&self, p: EyeParam) -> f32 {
        self.right_eye[p as usize]
    }
}

impl Default for ProceduralFaceParams {
    fn default() -> Self {
        Self {
            left_eye: Self::neutral_eye(),
            right_eye: Self::neutral_eye(),
            face_angle_deg: 0.0,
            face_center: [0.0, 0.0],
            face_scale: [1.0, 1.0],
        }
    }
}
