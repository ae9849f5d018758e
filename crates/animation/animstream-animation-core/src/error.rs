//! Load-time errors. Runtime playback never returns errors; it logs and carries on.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("animation document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("animation '{animation}' must be an array of keyframes")]
    NotAnArray { animation: String },

    #[error("animation '{animation}', keyframe {index}: {reason}")]
    Malformed {
        animation: String,
        index: usize,
        reason: String,
    },

    #[error("animation '{animation}', keyframe {index}: unknown body motion radius '{radius}'")]
    UnknownRadius {
        animation: String,
        index: usize,
        radius: String,
    },

    #[error(
        "animation '{animation}', keyframe {index}: {references} audio references but {probabilities} probabilities"
    )]
    ProbabilityCountMismatch {
        animation: String,
        index: usize,
        references: usize,
        probabilities: usize,
    },

    #[error("animation '{animation}', keyframe {index}: audio probabilities sum to {sum} (> 1.0)")]
    ProbabilitySumExceeded {
        animation: String,
        index: usize,
        sum: f32,
    },

    #[error("animation '{animation}', keyframe {index}: event_id must be a string")]
    EventIdNotString { animation: String, index: usize },
}
