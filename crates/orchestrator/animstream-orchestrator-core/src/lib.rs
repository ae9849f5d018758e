//! animstream-orchestrator
//!
//! Drives one control tick at a time: the timeline engine streams keyframe
//! messages, then the cube and backpack light schedulers resolve their layers,
//! and everything produced is handed to the device transport exactly once.

pub mod diagnostics;
pub mod scheduler;

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};

use animstream_animation_core::{Config, CoreEvent, Engine, Inputs, InstId, PlaybackCommand};
use animstream_api_core::{DeviceTransport, PoseStateProvider};
use animstream_lights_core::{BackpackLightScheduler, CubeLightScheduler, LightAnimLibrary, LightsConfig};

pub use crate::diagnostics::DiagnosticsCfg;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub animation: Config,
    pub lights: LightsConfig,
    pub diagnostics: DiagnosticsCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    pub epoch: u64,
    pub dt_ms: u32,
    /// Messages the transport accepted this tick.
    pub sent: usize,
    /// Messages the transport refused; they are not retried.
    pub failed: usize,
    pub events: Vec<CoreEvent>,
    /// Empty unless diagnostics are enabled.
    pub timings_ms: HashMap<String, f32>,
}

pub struct Orchestrator {
    pub(crate) cfg: OrchestratorConfig,
    pub(crate) epoch: u64,
    pub(crate) engine: Engine,
    pub(crate) cube_lights: CubeLightScheduler,
    pub(crate) backpack: BackpackLightScheduler,
    pub(crate) transport: Box<dyn DeviceTransport>,
    pub(crate) pending: Inputs,
}

impl Orchestrator {
    pub fn new(
        cfg: OrchestratorConfig,
        lights: LightAnimLibrary,
        pose: Box<dyn PoseStateProvider>,
        transport: Box<dyn DeviceTransport>,
    ) -> Self {
        Self {
            engine: Engine::new(cfg.animation.clone()),
            cube_lights: CubeLightScheduler::new(cfg.lights.clone(), Box::new(lights), pose),
            backpack: BackpackLightScheduler::new(cfg.lights.backpack.clone()),
            cfg,
            epoch: 0,
            transport,
            pending: Inputs::default(),
        }
    }

    /// Build from an animation document and a light library document.
    /// Individual bad animations or light anims are logged and skipped; an
    /// unreadable document is an error.
    pub fn from_json(
        cfg: OrchestratorConfig,
        animations_json: &str,
        lights_json: &str,
        pose: Box<dyn PoseStateProvider>,
        transport: Box<dyn DeviceTransport>,
    ) -> Result<Self> {
        let mut lights = LightAnimLibrary::new();
        let light_report = lights
            .load_json(lights_json)
            .context("failed to load light library")?;
        let mut orch = Self::new(cfg, lights, pose, transport);
        let report = orch
            .engine
            .load_animations_json(animations_json)
            .context("failed to load animations")?;
        for (name, err) in &report.failed {
            error!("animation '{name}' not loaded: {err}");
        }
        info!(
            "orchestrator ready: {} animations, {} light anims",
            report.loaded.len(),
            light_report.anims_loaded.len()
        );
        Ok(orch)
    }

    /// Replace the engine, e.g. to inject frame/audio providers or a seeded RNG.
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.cfg
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn cube_lights(&self) -> &CubeLightScheduler {
        &self.cube_lights
    }

    pub fn cube_lights_mut(&mut self) -> &mut CubeLightScheduler {
        &mut self.cube_lights
    }

    pub fn backpack(&self) -> &BackpackLightScheduler {
        &self.backpack
    }

    pub fn backpack_mut(&mut self) -> &mut BackpackLightScheduler {
        &mut self.backpack
    }

    /// Queue engine commands for the next tick.
    pub fn queue(&mut self, inputs: Inputs) {
        self.pending.commands.extend(inputs.commands);
    }

    pub fn play(&mut self, animation: impl Into<String>, num_loops: u32) {
        self.pending.commands.push(PlaybackCommand::Play {
            animation: animation.into(),
            num_loops,
        });
    }

    pub fn abort(&mut self, inst: InstId) {
        self.pending.commands.push(PlaybackCommand::Abort { inst });
    }

    pub fn abort_all(&mut self) {
        self.pending.commands.push(PlaybackCommand::AbortAll);
    }

    /// Advance by `dt_ms` and stream everything produced this tick.
    pub fn step(&mut self, dt_ms: u32) -> StreamFrame {
        self.epoch = self.epoch.wrapping_add(1);
        crate::scheduler::run_tick(self, dt_ms)
    }
}
