use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Per-phase timing collection for `StreamFrame::timings_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsCfg {
    pub enabled: bool,
}

impl Default for DiagnosticsCfg {
    fn default() -> Self {
        DiagnosticsCfg { enabled: true }
    }
}

/// Wall-clock phase timer; records nothing when diagnostics are off.
pub(crate) struct PhaseTimer {
    enabled: bool,
    started: Instant,
    phase_started: Instant,
    timings: HashMap<String, f32>,
}

impl PhaseTimer {
    pub(crate) fn new(cfg: &DiagnosticsCfg) -> Self {
        let now = Instant::now();
        Self {
            enabled: cfg.enabled,
            started: now,
            phase_started: now,
            timings: HashMap::new(),
        }
    }

    pub(crate) fn mark(&mut self, phase: &str) {
        let now = Instant::now();
        if self.enabled {
            let ms = (now - self.phase_started).as_secs_f32() * 1000.0;
            self.timings.insert(format!("{phase}_ms"), ms);
        }
        self.phase_started = now;
    }

    pub(crate) fn finish(mut self) -> HashMap<String, f32> {
        if self.enabled {
            let ms = self.started.elapsed().as_secs_f32() * 1000.0;
            self.timings.insert("total_ms".to_string(), ms);
        }
        self.timings
    }
}
