use thiserror::Error;

use crate::layer::LightLayer;

#[derive(Error, Debug)]
pub enum LightLoadError {
    #[error("light library is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("light anim '{anim}': {reason}")]
    Malformed { anim: String, reason: String },
}

/// Why a play request was refused. `play` reports these as `false`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlayError {
    #[error("no light anim for trigger '{0}'")]
    UnknownTrigger(String),

    #[error("{layer:?} layer is disabled while only the game layer is enabled")]
    LayerDisabled { layer: LightLayer },

    #[error("current {layer:?} anim '{anim}' cannot be overridden")]
    NotOverridable { layer: LightLayer, anim: String },

    #[error("cannot blend '{anim}' over an already blended anim")]
    AlreadyBlended { anim: String },
}
