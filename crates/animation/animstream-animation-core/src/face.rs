//! Procedural face interpolation between adjacent face keyframes.

use animstream_api_core::{ProceduralFaceParams, EYE_PARAM_COUNT};

/// Progress from `t_a` to `t_b`, clamped to `[0, 1]`. A non-increasing span counts as arrived.
pub fn fraction(t_a: u32, t_b: u32, current: u32) -> f32 {
    if t_b <= t_a {
        return 1.0;
    }
    let num = current.saturating_sub(t_a) as f32;
    let den = (t_b - t_a) as f32;
    (num / den).clamp(0.0, 1.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    // Exact at both ends: t=0 yields a, t=1 yields b.
    a * (1.0 - t) + b * t
}

fn lerp_eye(a: &[f32; EYE_PARAM_COUNT], b: &[f32; EYE_PARAM_COUNT], t: f32) -> [f32; EYE_PARAM_COUNT] {
    let mut out = [0.0; EYE_PARAM_COUNT];
    for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
        *o = lerp(*x, *y, t);
    }
    out
}

/// Blend every eye parameter and the global face transform between `a` and `b`.
pub fn interpolate(
    a: &ProceduralFaceParams,
    b: &ProceduralFaceParams,
    t_a: u32,
    t_b: u32,
    current: u32,
) -> ProceduralFaceParams {
    let t = fraction(t_a, t_b, current);
    if t <= 0.0 {
        return a.clone();
    }
    if t >= 1.0 {
        return b.clone();
    }
    ProceduralFaceParams {
        left_eye: lerp_eye(&a.left_eye, &b.left_eye, t),
        right_eye: lerp_eye(&a.right_eye, &b.right_eye, t),
        face_angle_deg: lerp(a.face_angle_deg, b.face_angle_deg, t),
        face_center: [
            lerp(a.face_center[0], b.face_center[0], t),
            lerp(a.face_center[1], b.face_center[1], t),
        ],
        face_scale: [
            lerp(a.face_scale[0], b.face_scale[0], t),
            lerp(a.face_scale[1], b.face_scale[1], t),
        ],
    }
}
