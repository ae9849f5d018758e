#![allow(dead_code)]
//! Engine: owns the animation library, active playbacks and injected capabilities.
//!
//! Methods:
//! - new, with_capabilities, load_animations_json, play, play_track, abort, update

use std::sync::Arc;

use log::{debug, warn};

use animstream_api_core::{
    AudioChunkProvider, DeviceMessage, FrameProvider, NullAudio, NullFrames, PcgRandom,
    RandomSource,
};

use crate::config::Config;
use crate::error::LoadError;
use crate::ids::{IdAllocator, InstId};
use crate::inputs::{Inputs, PlaybackCommand};
use crate::keyframe::KeyframeContext;
use crate::library::{AnimationLibrary, LoadReport, TrackSource};
use crate::outputs::{CoreEvent, Outputs};
use crate::playback::{PassState, PlaybackInstance};
use crate::track::{Channel, Track};

/// External services the engine consults while streaming.
pub struct Capabilities {
    pub frames: Box<dyn FrameProvider>,
    pub audio: Box<dyn AudioChunkProvider>,
    pub rng: Box<dyn RandomSource>,
}

impl Capabilities {
    /// No face frames, no audio chunks, PCG random seeded from `cfg.rng_seed`.
    pub fn standalone(cfg: &Config) -> Self {
        Self {
            frames: Box::new(NullFrames),
            audio: Box::new(NullAudio),
            rng: Box::new(PcgRandom::new(cfg.rng_seed)),
        }
    }
}

pub struct Engine {
    cfg: Config,
    ids: IdAllocator,
    library: AnimationLibrary,
    /// Active playbacks in start order.
    instances: Vec<PlaybackInstance>,
    caps: Capabilities,
    scratch: Vec<(Channel, DeviceMessage)>,
    outputs: Outputs,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        let caps = Capabilities::standalone(&cfg);
        Self::with_capabilities(cfg, caps)
    }

    pub fn with_capabilities(cfg: Config, caps: Capabilities) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            library: AnimationLibrary::new(),
            instances: Vec::new(),
            caps,
            scratch: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn library(&self) -> &AnimationLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut AnimationLibrary {
        &mut self.library
    }

    pub fn load_animations_json(&mut self, json: &str) -> Result<LoadReport, LoadError> {
        self.library.load_json(json, &self.cfg)
    }

    /// Start a library animation. Unknown names are logged and yield `None`.
    pub fn play(&mut self, animation: &str, num_loops: u32) -> Option<InstId> {
        let Some(track) = self.library.resolve_track(animation) else {
            warn!("play: animation '{animation}' not found");
            return None;
        };
        let anim = self.library.id_of(animation);
        let id = self.ids.alloc_inst();
        debug!("play '{animation}' as {id:?}");
        self.instances
            .push(PlaybackInstance::new(id, anim, track, num_loops));
        Some(id)
    }

    /// Start a track that is not part of the library.
    pub fn play_track(&mut self, track: Arc<Track>, num_loops: u32) -> InstId {
        let id = self.ids.alloc_inst();
        self.instances
            .push(PlaybackInstance::new(id, None, track, num_loops));
        id
    }

    /// Drop a playback and its cursors. Returns `false` for unknown ids.
    pub fn abort(&mut self, inst: InstId) -> bool {
        match self.instances.iter().position(|i| i.id == inst) {
            Some(pos) => {
                let removed = self.instances.remove(pos);
                self.outputs.push_event(CoreEvent::PlaybackAborted {
                    inst,
                    animation: removed.name().to_string(),
                });
                true
            }
            None => {
                warn!("abort: no playback {inst:?}");
                false
            }
        }
    }

    pub fn abort_all(&mut self) {
        for removed in self.instances.drain(..) {
            self.outputs.push_event(CoreEvent::PlaybackAborted {
                inst: removed.id,
                animation: removed.name().to_string(),
            });
        }
    }

    pub fn is_playing(&self, inst: InstId) -> bool {
        self.instances.iter().any(|i| i.id == inst)
    }

    pub fn instance(&self, inst: InstId) -> Option<&PlaybackInstance> {
        self.instances.iter().find(|i| i.id == inst)
    }

    pub fn active_count(&self) -> usize {
        self.instances.len()
    }

    fn apply_inputs(&mut self, inputs: Inputs) {
        for cmd in inputs.commands {
            match cmd {
                PlaybackCommand::Play {
                    animation,
                    num_loops,
                } => match self.play(&animation, num_loops) {
                    Some(inst) => self
                        .outputs
                        .push_event(CoreEvent::PlaybackStarted { inst, animation }),
                    None => self.outputs.push_event(CoreEvent::Error {
                        message: format!("animation '{animation}' not found"),
                    }),
                },
                PlaybackCommand::Abort { inst } => {
                    self.abort(inst);
                }
                PlaybackCommand::AbortAll => self.abort_all(),
            }
        }
    }

    /// Apply queued commands, then stream one tick of every playback and move
    /// each playback's clock forward by `dt_ms`.
    pub fn update(&mut self, dt_ms: u32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();
        self.apply_inputs(inputs);

        let mut ctx = KeyframeContext {
            config: &self.cfg,
            frames: self.caps.frames.as_ref(),
            audio: self.caps.audio.as_ref(),
            rng: self.caps.rng.as_mut(),
            now_ms: 0,
            dt_ms,
        };

        let mut i = 0;
        while i < self.instances.len() {
            let inst = &mut self.instances[i];
            self.scratch.clear();
            let pass = inst.advance(dt_ms, &mut ctx, &mut self.scratch);
            let id = inst.id;
            for (channel, message) in self.scratch.drain(..) {
                self.outputs.push_message(id, channel, message);
            }
            match pass {
                PassState::Running => i += 1,
                PassState::Looped => {
                    self.outputs.push_event(CoreEvent::LoopCompleted {
                        inst: id,
                        loops_completed: inst.loops_completed(),
                    });
                    i += 1;
                }
                PassState::Finished => {
                    let done = self.instances.remove(i);
                    self.outputs.push_event(CoreEvent::PlaybackEnded {
                        inst: id,
                        animation: done.name().to_string(),
                    });
                }
            }
        }
        &self.outputs
    }
}
