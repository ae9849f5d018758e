//! Audio reference selection for RobotAudio keyframes.

use animstream_api_core::RandomSource;

use crate::keyframe::AudioRef;

/// Slack allowed when checking that authored probabilities do not exceed 1.
pub const PROBABILITY_SUM_TOLERANCE: f32 = 1.0e-5;

/// Pick which alternative to play.
///
/// Without probabilities the pick is uniform (a single reference is always
/// chosen). With probabilities the references partition `[0, 1)` in order,
/// zero-probability entries are skipped, and a draw that lands past the last
/// range selects nothing. An empty list selects nothing.
pub fn select_index(
    references: &[AudioRef],
    use_probability: bool,
    rng: &mut dyn RandomSource,
) -> Option<usize> {
    if references.is_empty() {
        return None;
    }
    if !use_probability {
        if references.len() == 1 {
            return Some(0);
        }
        let last = i32::try_from(references.len() - 1).unwrap_or(i32::MAX);
        return usize::try_from(rng.int_in_range(0, last)).ok();
    }

    let sample = rng.unit();
    let mut min = 0.0f64;
    for (i, r) in references.iter().enumerate() {
        if r.probability <= 0.0 {
            continue;
        }
        let max = min + r.probability as f64;
        if sample >= min && sample < max {
            return Some(i);
        }
        min = max;
    }
    None
}

/// Equal weights `1/n` for references authored without probabilities.
pub fn equal_probabilities(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f32; n]
}

/// Sum of the authored probabilities.
pub fn probability_sum(references: &[AudioRef]) -> f32 {
    references.iter().map(|r| r.probability).sum()
}
