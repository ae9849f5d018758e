#![allow(dead_code)]
//! Input contracts to the timeline engine.
//!
//! Requests queued between ticks and applied at the start of `Engine::update`.

use serde::{Deserialize, Serialize};

use crate::ids::InstId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum PlaybackCommand {
    /// Start a new playback of a library animation. `num_loops == 0` loops until aborted.
    Play { animation: String, num_loops: u32 },
    Abort { inst: InstId },
    AbortAll,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    pub commands: Vec<PlaybackCommand>,
}

impl Inputs {
    pub fn play(animation: impl Into<String>) -> Self {
        Self {
            commands: vec![PlaybackCommand::Play {
                animation: animation.into(),
                num_loops: 1,
            }],
        }
    }

    pub fn push(mut self, command: PlaybackCommand) -> Self {
        self.commands.push(command);
        self
    }
}
